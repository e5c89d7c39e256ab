pub mod corpus;
pub mod index;
pub mod providers;
pub mod recommendations;
pub mod similarity;
pub mod text;
pub mod vectorizer;
