// lib.rs
pub mod alignment_record;
pub mod bam;
pub mod cigar;
pub mod commands;
pub mod counter;
pub mod error;
pub mod md_tag;
pub mod nucleotide;
pub mod operator;
pub mod output;
pub mod profile;
pub mod reconcile;
pub mod run_stack;
pub mod snapshot;
pub mod walker;
