//! Table definition for the Cairn row store.

use super::column::Column;
use crate::error::{Error, Result};
use crate::types::{DataType, TableId};

/// A table definition: identity, persistence mode and columns.
#[derive(Clone, Debug)]
pub struct Table {
    /// Table identifier. Negative ids never touch durable storage.
    id: TableId,
    /// Table name.
    name: String,
    /// Column definitions.
    columns: Vec<Column>,
    /// Whether rows of this table go to the record store.
    persistent: bool,
}

impl Table {
    /// Creates a new table with the given id, name and columns.
    pub fn new(id: TableId, name: impl Into<String>, columns: Vec<Column>) -> Self {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.with_index(i))
            .collect();

        Self {
            id,
            name: name.into(),
            columns,
            persistent: true,
        }
    }

    /// Returns the table id.
    #[inline]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Returns the table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the columns.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns whether rows of this table are persisted.
    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Gets a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Gets a column index by name.
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Returns true if any column holds large objects.
    pub fn contains_large_object(&self) -> bool {
        self.columns.iter().any(Column::is_large_object)
    }
}

/// Builder for creating table definitions.
pub struct TableBuilder {
    id: TableId,
    name: String,
    columns: Vec<Column>,
    persistent: bool,
}

impl TableBuilder {
    /// Creates a new table builder.
    pub fn new(id: TableId, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        Ok(Self {
            id,
            name,
            columns: Vec::new(),
            persistent: true,
        })
    }

    /// Validates a name follows naming rules.
    fn check_naming_rules(name: &str) -> Result<()> {
        let first = match name.chars().next() {
            Some(c) => c,
            None => return Err(Error::invalid_schema("Name cannot be empty")),
        };
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::invalid_schema(format!(
                "Name must start with letter or underscore: {}",
                name
            )));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::invalid_schema(format!(
                "Name contains invalid characters: {}",
                name
            )));
        }
        Ok(())
    }

    /// Adds a column to the table.
    pub fn add_column(mut self, name: impl Into<String>, data_type: DataType) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        if self.columns.iter().any(|c| c.name() == name) {
            return Err(Error::invalid_schema(format!(
                "Column already exists: {}",
                name
            )));
        }
        self.columns.push(Column::new(name, data_type));
        Ok(self)
    }

    /// Sets whether the table is persistent. Non-persistent tables keep
    /// their rows in memory only.
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Builds the table definition.
    pub fn build(self) -> Result<Table> {
        let mut table = Table::new(self.id, self.name, self.columns);
        table.persistent = self.persistent;
        Ok(table)
    }
}
