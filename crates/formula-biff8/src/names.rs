//! Read-only view of the workbook's defined-name table (`NAME` records).

/// Name table lookups needed while encoding.
pub trait NameTable {
    /// Number of `NAME` records.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 1-based index of the add-in placeholder name matching `name` (ASCII case-insensitive).
    ///
    /// Only entries flagged as add-in placeholders qualify; a regular defined name with the same
    /// text is ignored.
    fn add_in_index(&self, name: &str) -> Option<u16>;
}

/// One `NAME` record as seen by the encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameEntry {
    pub name: String,
    /// `fFunc`/add-in placeholder used to carry a future or add-in function's identity.
    pub is_add_in: bool,
}

/// Vec-backed [`NameTable`]. Entry order is `NAME` record order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefinedNames {
    entries: Vec<NameEntry>,
}

impl DefinedNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a regular defined name, returning its 1-based index.
    pub fn push_name(&mut self, name: impl Into<String>) -> usize {
        self.push(NameEntry {
            name: name.into(),
            is_add_in: false,
        })
    }

    /// Append an add-in placeholder name (e.g. `_xlfn.IFS`), returning its 1-based index.
    pub fn push_add_in(&mut self, name: impl Into<String>) -> usize {
        self.push(NameEntry {
            name: name.into(),
            is_add_in: true,
        })
    }

    pub fn push(&mut self, entry: NameEntry) -> usize {
        self.entries.push(entry);
        self.entries.len()
    }

    pub fn entries(&self) -> &[NameEntry] {
        &self.entries
    }
}

impl FromIterator<NameEntry> for DefinedNames {
    fn from_iter<I: IntoIterator<Item = NameEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl NameTable for DefinedNames {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn add_in_index(&self, name: &str) -> Option<u16> {
        let name = name.trim();
        let position = self
            .entries
            .iter()
            .position(|entry| entry.is_add_in && entry.name.eq_ignore_ascii_case(name))?;
        u16::try_from(position + 1).ok()
    }
}
