pub mod embedding_summarizer;
