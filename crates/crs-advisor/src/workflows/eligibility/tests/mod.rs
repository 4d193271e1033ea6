mod bands;
mod common;
mod scoring;
