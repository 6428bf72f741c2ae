//! Whole-parse behavior on the statement grammar

mod tests_artifact;
mod tests_recovery;
mod tests_tree;
