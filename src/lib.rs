pub mod app;
pub mod config;
pub mod convert;
pub mod database;
pub mod domain;
pub mod download;
pub mod error;
pub mod fasta;
pub mod fs_util;
pub mod genbank;
pub mod gff;
pub mod ncbi;
pub mod orthofinder;
pub mod output;
pub mod rewrite;
pub mod validate;
