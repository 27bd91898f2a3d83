//! Named sub-splits exposed by a data source.

use crate::metrics::GlueTask;
use crate::training::Stage;
use serde::{Deserialize, Serialize};

/// A data source that may divide a stage into several named sub-splits,
/// each served by its own dataloader.
pub trait SplitSource {
    fn splits(&self, stage: Stage) -> Option<&[String]>;
}

/// Split names per stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSplits {
    pub train_splits: Vec<String>,
    pub val_splits: Vec<String>,
    pub test_splits: Vec<String>,
}

impl NamedSplits {
    /// GLUE split names; MNLI serves matched and mismatched evaluation sets.
    pub fn for_task(task: GlueTask) -> Self {
        let (val, test) = match task {
            GlueTask::Mnli => (
                vec!["validation_matched", "validation_mismatched"],
                vec!["test_matched", "test_mismatched"],
            ),
            _ => (vec!["validation"], vec!["test"]),
        };
        Self {
            train_splits: vec!["train".to_string()],
            val_splits: val.into_iter().map(String::from).collect(),
            test_splits: test.into_iter().map(String::from).collect(),
        }
    }
}

impl SplitSource for NamedSplits {
    fn splits(&self, stage: Stage) -> Option<&[String]> {
        let splits = match stage {
            Stage::Train => &self.train_splits,
            Stage::Val => &self.val_splits,
            Stage::Test => &self.test_splits,
        };
        Some(splits.as_slice())
    }
}

/// Log-key suffix of a sub-split: the text after its last `_`.
pub fn split_suffix(split: &str) -> &str {
    split.rsplit('_').next().unwrap_or(split)
}
