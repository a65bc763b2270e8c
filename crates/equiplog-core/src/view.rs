//! Filtered, paginated view over the active record set.

use equiplog_parser::EquipmentRecord;
use serde::Serialize;

use crate::activity::ActivityLogEntry;
use crate::error::ExportError;

pub const PAGE_SIZE: usize = 5;
pub const EXPORT_FILENAME: &str = "equipment_data_export.csv";
pub const NO_RESULTS: &str = "No equipment found matching criteria";

/// One rendered page of the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentPage {
    pub rows: Vec<EquipmentRecord>,
    /// 1-based.
    pub page: usize,
    pub total_pages: usize,
    /// Position of the first and last row shown; `0` when nothing matches.
    pub first: usize,
    pub last: usize,
    pub total: usize,
    pub search_term: String,
    pub critical_only: bool,
    /// [`NO_RESULTS`] when nothing matches the filter.
    pub message: Option<&'static str>,
}

impl EquipmentPage {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// `"6-10 of 12"`, or `"0-0 of 0"` for an empty result.
    pub fn range_label(&self) -> String {
        format!("{}-{} of {}", self.first, self.last, self.total)
    }
}

#[derive(Debug, Clone)]
pub struct EquipmentView {
    records: Vec<EquipmentRecord>,
    search_term: String,
    critical_only: bool,
    page: usize,
}

impl Default for EquipmentView {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl EquipmentView {
    pub fn new(records: Vec<EquipmentRecord>) -> Self {
        Self {
            records,
            search_term: String::new(),
            critical_only: false,
            page: 1,
        }
    }

    pub fn records(&self) -> &[EquipmentRecord] {
        &self.records
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn critical_only(&self) -> bool {
        self.critical_only
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    /// Swap in a new active set. Search and filter survive, paging restarts.
    pub fn replace_records(&mut self, records: Vec<EquipmentRecord>) {
        self.records = records;
        self.page = 1;
    }

    /// Apply both filter inputs; any change returns to page 1.
    pub fn filter(&mut self, search_term: &str, critical_only: bool) {
        self.set_search_term(search_term);
        self.set_critical_only(critical_only);
    }

    pub fn set_search_term(&mut self, term: &str) {
        if self.search_term != term {
            self.search_term = term.to_string();
            self.page = 1;
        }
    }

    pub fn set_critical_only(&mut self, critical_only: bool) {
        if self.critical_only != critical_only {
            self.critical_only = critical_only;
            self.page = 1;
        }
    }

    pub fn toggle_critical_only(&mut self) {
        self.set_critical_only(!self.critical_only);
    }

    /// Records passing the current search and critical filter, in order.
    pub fn filtered(&self) -> Vec<&EquipmentRecord> {
        let needle = self.search_term.to_lowercase();
        self.records
            .iter()
            .filter(|record| {
                record.name.to_lowercase().contains(&needle)
                    || record.equipment_type.to_lowercase().contains(&needle)
            })
            .filter(|record| !self.critical_only || record.status.needs_attention())
            .collect()
    }

    pub fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(PAGE_SIZE)
    }

    /// Rows on 1-based page `n`; empty when `n` is out of range.
    pub fn page(&self, n: usize) -> Vec<&EquipmentRecord> {
        if n == 0 {
            return Vec::new();
        }
        self.filtered()
            .into_iter()
            .skip((n - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect()
    }

    /// Jump to page `n`, clamped to the available pages.
    pub fn go_to_page(&mut self, n: usize) {
        self.page = n.clamp(1, self.total_pages().max(1));
    }

    pub fn next(&mut self) {
        if self.page < self.total_pages() {
            self.page += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }

    pub fn current(&self) -> EquipmentPage {
        let filtered = self.filtered();
        let total = filtered.len();
        let start = (self.page - 1) * PAGE_SIZE;
        let rows: Vec<EquipmentRecord> = filtered
            .into_iter()
            .skip(start)
            .take(PAGE_SIZE)
            .cloned()
            .collect();

        let (first, last) = if rows.is_empty() {
            (0, 0)
        } else {
            (start + 1, start + rows.len())
        };

        EquipmentPage {
            page: self.page,
            total_pages: total.div_ceil(PAGE_SIZE),
            first,
            last,
            total,
            rows,
            search_term: self.search_term.clone(),
            critical_only: self.critical_only,
            message: (total == 0).then_some(NO_RESULTS),
        }
    }

    /// CSV of the whole active set, ignoring filter and page, or `None` when
    /// the set is empty. Header is the record field names; cells containing
    /// delimiters or quotes are quoted.
    pub fn export_csv(&self) -> Result<Option<String>, ExportError> {
        if self.records.is_empty() {
            return Ok(None);
        }

        let mut buffer = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buffer);
            writer.write_record(EquipmentRecord::FIELD_NAMES)?;
            for record in &self.records {
                writer.write_record(record.values())?;
            }
            writer.flush()?;
        }

        Ok(Some(String::from_utf8(buffer)?))
    }

    /// Make a history entry's payload the active set. Entries without a
    /// payload leave the view untouched.
    pub fn restore(&mut self, entry: &ActivityLogEntry) -> bool {
        match &entry.payload {
            Some(records) => {
                self.replace_records(records.clone());
                true
            }
            None => false,
        }
    }
}
