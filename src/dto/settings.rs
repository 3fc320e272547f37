use std::collections::HashMap;

/// Bulk settings submission: one field per setting key. Unchecked
/// checkboxes simply do not post, so boolean settings absent from the map
/// are written back as `false`.
pub type SettingsForm = HashMap<String, String>;
