use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// One mod as tracked by the game's order file. `display_name` and `folder`
/// are derived on every load and never written back.
#[derive(Debug, Clone)]
pub struct ModRecord {
    pub id: String,
    pub order: usize,
    pub enabled: bool,
    pub workshop_item_id: u64,
    pub display_name: String,
    pub folder: PathBuf,
    /// Verbatim settings_fold_open attribute; round-tripped, never interpreted.
    pub fold_open: String,
}

impl ModRecord {
    /// Stable cross-session key: workshop items can shadow a local mod with
    /// the same id, so the workshop item id is folded in.
    pub fn uid(&self) -> String {
        if self.workshop_item_id > 0 {
            format!("{}_workshop_{}", self.id, self.workshop_item_id)
        } else {
            self.id.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown mod uid: {0}")]
    UnknownUid(String),
    #[error("reorder sequence is not a permutation of the current mods")]
    NotAPermutation,
}

/// Authoritative ordered mod collection for one load/save session.
/// Records are kept sorted ascending by `order`, and `order` values always
/// form a dense permutation of 0..len.
#[derive(Debug, Default)]
pub struct ModRegistry {
    records: Vec<ModRecord>,
}

impl ModRegistry {
    /// Replaces all prior contents with a fresh snapshot.
    pub fn load(&mut self, mut records: Vec<ModRecord>) {
        records.sort_by_key(|record| record.order);
        self.records = records;
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Canonical sequence for display and write-back.
    pub fn sorted_view(&self) -> &[ModRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, uid: &str) -> Option<&ModRecord> {
        self.records.iter().find(|record| record.uid() == uid)
    }

    pub fn toggle_enabled(&mut self, uid: &str, value: bool) -> Result<(), RegistryError> {
        match self.records.iter_mut().find(|record| record.uid() == uid) {
            Some(record) => {
                record.enabled = value;
                Ok(())
            }
            None => Err(RegistryError::UnknownUid(uid.to_string())),
        }
    }

    /// Accepts only an exact permutation of the current uids; each record's
    /// order becomes its index in the new sequence. Anything else leaves the
    /// registry untouched.
    pub fn reorder(&mut self, new_order: &[String]) -> Result<(), RegistryError> {
        if new_order.len() != self.records.len() {
            return Err(RegistryError::NotAPermutation);
        }
        let requested: BTreeSet<&str> = new_order.iter().map(String::as_str).collect();
        if requested.len() != new_order.len() {
            return Err(RegistryError::NotAPermutation);
        }
        if !self
            .records
            .iter()
            .all(|record| requested.contains(record.uid().as_str()))
        {
            return Err(RegistryError::NotAPermutation);
        }

        for record in &mut self.records {
            let uid = record.uid();
            if let Some(index) = new_order.iter().position(|candidate| *candidate == uid) {
                record.order = index;
            }
        }
        self.records.sort_by_key(|record| record.order);
        Ok(())
    }

    /// Full-overwrite semantics: every record ends up enabled iff its uid is
    /// in the target set. Target uids with no matching record are ignored.
    pub fn apply_preset(&mut self, target_uids: &BTreeSet<String>) {
        for record in &mut self.records {
            record.enabled = target_uids.contains(&record.uid());
        }
    }

    pub fn enabled_uids(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .filter(|record| record.enabled)
            .map(|record| record.uid())
            .collect()
    }
}
