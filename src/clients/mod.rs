pub mod wikipedia;
