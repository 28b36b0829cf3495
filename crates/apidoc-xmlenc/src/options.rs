//! Codec settings as they appear in a configuration file.

use serde::{Deserialize, Serialize};

/// Settings for [`decode_with`](crate::decode_with).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecodeOptions {
    /// Namespace URI whose prefix element names must carry
    pub namespace: String,
}

/// Settings for [`encode_with`](crate::encode_with).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncodeOptions {
    /// One character, repeated; empty disables line breaks
    pub indent: String,
    pub namespace: String,
    /// Requires `namespace`
    pub prefix: String,
}

impl DecodeOptions {
    pub fn new(namespace: impl Into<String>) -> Self {
        DecodeOptions {
            namespace: namespace.into(),
        }
    }
}

impl EncodeOptions {
    pub fn new(indent: impl Into<String>) -> Self {
        EncodeOptions {
            indent: indent.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self.prefix = prefix.into();
        self
    }
}
