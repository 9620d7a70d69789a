use std::collections::BTreeMap;

use tracing::info;

use schoolforge_core::{
    AcademicRecord, CatalogEntry, GraduateRecord, SchoolDataset, StudentRow, TerminatedRecord,
};

use crate::errors::SimulationError;

/// A named table handed to a warehouse sink.
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseTable {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Destination for the five output tables.
///
/// Implementations must make `ensure_dataset` idempotent (create if absent,
/// no-op if present) and give `replace_table` truncate-and-replace
/// semantics. Errors surface directly to the caller; retrying is the
/// caller's decision, not the sink's.
pub trait WarehouseSink {
    fn ensure_dataset(&mut self, dataset_id: &str) -> Result<(), SimulationError>;
    fn replace_table(
        &mut self,
        dataset_id: &str,
        table: WarehouseTable,
    ) -> Result<(), SimulationError>;
}

/// Push all five tables into the sink, creating the dataset first.
pub fn upload_dataset(
    sink: &mut dyn WarehouseSink,
    dataset_id: &str,
    dataset: &SchoolDataset,
) -> Result<(), SimulationError> {
    sink.ensure_dataset(dataset_id)?;
    for table in tables(dataset) {
        info!(dataset_id, table = %table.name, rows = table.rows.len(), "uploading table");
        sink.replace_table(dataset_id, table)?;
    }
    Ok(())
}

fn tables(dataset: &SchoolDataset) -> Vec<WarehouseTable> {
    vec![
        table("grades", CatalogEntry::HEADER, dataset.catalog.iter().map(|r| r.to_row())),
        table("students", StudentRow::HEADER, dataset.students.iter().map(|r| r.to_row())),
        table(
            "academic",
            AcademicRecord::HEADER,
            dataset.academics.iter().map(|r| r.to_row()),
        ),
        table(
            "graduates",
            GraduateRecord::HEADER,
            dataset.graduates.iter().map(|r| r.to_row()),
        ),
        table(
            "terminated",
            TerminatedRecord::HEADER,
            dataset.terminated.iter().map(|r| r.to_row()),
        ),
    ]
}

fn table(
    name: &str,
    header: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> WarehouseTable {
    WarehouseTable {
        name: name.to_string(),
        header: header.iter().map(|h| h.to_string()).collect(),
        rows: rows.collect(),
    }
}

/// In-memory sink used in tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    datasets: BTreeMap<String, BTreeMap<String, WarehouseTable>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self, dataset_id: &str) -> Option<&BTreeMap<String, WarehouseTable>> {
        self.datasets.get(dataset_id)
    }

    pub fn table(&self, dataset_id: &str, name: &str) -> Option<&WarehouseTable> {
        self.datasets.get(dataset_id)?.get(name)
    }
}

impl WarehouseSink for MemoryWarehouse {
    fn ensure_dataset(&mut self, dataset_id: &str) -> Result<(), SimulationError> {
        self.datasets.entry(dataset_id.to_string()).or_default();
        Ok(())
    }

    fn replace_table(
        &mut self,
        dataset_id: &str,
        table: WarehouseTable,
    ) -> Result<(), SimulationError> {
        let dataset = self.datasets.get_mut(dataset_id).ok_or_else(|| {
            SimulationError::Warehouse(format!("dataset '{dataset_id}' does not exist"))
        })?;
        dataset.insert(table.name.clone(), table);
        Ok(())
    }
}
