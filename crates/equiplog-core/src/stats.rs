use equiplog_parser::{leading_number, EquipmentRecord, StatusKind};
use polars::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub equipment_type: String,
    pub count: usize,
}

/// Aggregate figures for the dashboard header cards and charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetStats {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub stable: usize,
    /// Records whose status is operator-supplied text.
    pub other: usize,
    /// Mean over numeric pressure readings; 0 when there are none.
    pub average_pressure: f64,
    /// Mean over numeric temperature readings; 0 when there are none.
    pub average_temp: f64,
    /// Most common equipment types first, ties by name.
    pub type_counts: Vec<TypeCount>,
}

impl DatasetStats {
    pub fn from_records(records: &[EquipmentRecord]) -> PolarsResult<Self> {
        if records.is_empty() {
            return Ok(Self::default());
        }

        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.status.kind() {
                Some(StatusKind::Critical) => stats.critical += 1,
                Some(StatusKind::Warning) => stats.warning += 1,
                Some(StatusKind::Stable) => stats.stable += 1,
                None => stats.other += 1,
            }
        }

        let types: Vec<&str> = records.iter().map(|r| r.equipment_type.as_str()).collect();
        let pressures: Vec<Option<f64>> = records.iter().map(|r| reading(&r.pressure)).collect();
        let temps: Vec<Option<f64>> = records.iter().map(|r| reading(&r.temp)).collect();
        let df = df![
            "type" => types,
            "pressure" => pressures,
            "temp" => temps,
        ]?;

        stats.average_pressure = df.column("pressure")?.f64()?.mean().unwrap_or(0.0);
        stats.average_temp = df.column("temp")?.f64()?.mean().unwrap_or(0.0);

        let counts = df
            .lazy()
            .group_by([col("type")])
            .agg([len().cast(DataType::Int64).alias("count")])
            .collect()?;
        let names = counts.column("type")?.str()?;
        let values = counts.column("count")?.i64()?;

        let mut type_counts: Vec<TypeCount> = names
            .iter()
            .zip(values.iter())
            .filter_map(|(name, count)| {
                Some(TypeCount {
                    equipment_type: name?.to_string(),
                    count: usize::try_from(count?).ok()?,
                })
            })
            .collect();
        type_counts.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.equipment_type.cmp(&b.equipment_type))
        });
        stats.type_counts = type_counts;

        Ok(stats)
    }
}

fn reading(text: &str) -> Option<f64> {
    leading_number(text).filter(|value| value.is_finite())
}
