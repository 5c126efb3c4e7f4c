//! Data operations a caller can perform against a fileset.
//!
//! Every facade call is tagged with one of these. The tag shows up in
//! tracing spans and in errors that reject an operation outright.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FilesetDataOperation {
    ListStatus,
    GetFileStatus,
    Exists,
    Rename,
    Append,
    Create,
    Delete,
    Open,
    Mkdirs,
    CreatedTime,
    ModifiedTime,
    CopyFile,
    CatFile,
    GetFile,
}

impl FilesetDataOperation {
    /// Parse from string (case-insensitive, snake_case).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListStatus => "list_status",
            Self::GetFileStatus => "get_file_status",
            Self::Exists => "exists",
            Self::Rename => "rename",
            Self::Append => "append",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Open => "open",
            Self::Mkdirs => "mkdirs",
            Self::CreatedTime => "created_time",
            Self::ModifiedTime => "modified_time",
            Self::CopyFile => "copy_file",
            Self::CatFile => "cat_file",
            Self::GetFile => "get_file",
        }
    }
}

impl std::fmt::Display for FilesetDataOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_agree() {
        for op in [
            FilesetDataOperation::ListStatus,
            FilesetDataOperation::GetFileStatus,
            FilesetDataOperation::CopyFile,
            FilesetDataOperation::GetFile,
        ] {
            assert_eq!(FilesetDataOperation::from_str(op.as_str()), Some(op));
        }
    }
}
