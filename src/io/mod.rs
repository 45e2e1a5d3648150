//! # IO Module
//!
//! Readers and writers at the edges of the analysis: dataset CSVs, similarity and coordinate
//! exports, record JSON files, and word lists.

pub mod csv;
pub mod json;
pub mod text;

pub use self::csv::{
    export_phrases_csv, export_reduced_csv, export_similarity_csv, extract_records_from_csv,
    read_csv_fields, read_reduced_csv, reduced_header, rows_to_process, DEFAULT_PROCESSED_ROWS,
};
pub use json::{load_records_json, save_records_json};
pub use text::{
    clean_and_split_text, is_text_file_path, parse_word_list, read_words_file, resolve_word_input,
};
