use csv::StringRecord;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::ApiError;
use crate::model::{Label, TableKind};

pub const DEFAULT_ROWS: usize = 50;

const CATEGORIES: [&str; 5] = ["Electronics", "Clothing", "Home & Garden", "Sports", "Books"];
const BRANDS: [&str; 5] = ["BrandA", "BrandB", "BrandC", "BrandD", "BrandE"];


/// Writes `count` synthetic rows of `kind` to `path`, replacing whatever was there.
/// Only judgement labels depend on `rng`; every other field is a function of the row index.
pub fn generate<R: Rng>(
    kind: TableKind,
    path: &Path,
    count: usize,
    rng: &mut R,
) -> Result<(), ApiError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let headers = StringRecord::from(kind.headers().to_vec());
    let rows: Vec<StringRecord> = (1..=count)
        .map(|i| StringRecord::from(synthetic_row(kind, i, rng)))
        .collect();

    write_table(path, &headers, &rows)
}

fn synthetic_row<R: Rng>(kind: TableKind, i: usize, rng: &mut R) -> Vec<String> {
    let product_id = format!("P{i:04}");
    match kind {
        TableKind::VideoDescription => vec![
            product_id,
            format!("Video shows product features {i}"),
            format!("Duration: {} seconds", 30 + i % 60),
            format!("Quality: {}", if i % 3 == 0 { "HD" } else { "Standard" }),
        ],
        TableKind::ProductInfo => vec![
            product_id,
            BRANDS[i % BRANDS.len()].to_string(),
            format!("${}", (i * 10) % 500 + 20),
            format!("Model-{i}-XL"),
            CATEGORIES[i % CATEGORIES.len()].to_string(),
        ],
        TableKind::Judgement => {
            let label = Label::ALL[rng.gen_range(0..Label::ALL.len())];
            vec![
                product_id,
                format!("Sample Product {i}"),
                CATEGORIES[i % CATEGORIES.len()].to_string(),
                format!("http://example.com/video{i}.mp4"),
                format!("http://example.com/thumb{i}.jpg"),
                format!("http://example.com/gt{i}.jpg"),
                label.as_str().to_string(),
                reason_for(label, i),
            ]
        }
    }
}

fn reason_for(label: Label, i: usize) -> String {
    match label {
        Label::Yes => format!("Product clearly matches criteria {i}"),
        Label::NotApplicable => format!("Product information insufficient for determination {i}"),
        Label::No => format!("Product does not meet the required standards {i}"),
    }
}


fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.tmp"))
}

/// Writes header + rows to a sibling temp file, then renames it over `path`.
pub fn write_table(
    path: &Path,
    headers: &StringRecord,
    rows: &[StringRecord],
) -> Result<(), ApiError> {
    let tmp = temp_path_for(path);
    let written = write_records(&tmp, headers, rows).and_then(|()| {
        std::fs::rename(&tmp, path)?;
        Ok(())
    });
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    written
}

fn write_records(
    path: &Path,
    headers: &StringRecord,
    rows: &[StringRecord],
) -> Result<(), ApiError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}


/// Every record of a table plus its header row.
pub struct RawTable {
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
}

impl RawTable {
    pub fn column(&self, table: TableKind, name: &str) -> Result<usize, ApiError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| ApiError::MalformedTable {
                table: table.name().to_string(),
                column: name.to_string(),
            })
    }
}

pub fn read_table(path: &Path) -> Result<RawTable, ApiError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
    Ok(RawTable { headers, rows })
}


pub type KeyedRows = HashMap<String, BTreeMap<String, String>>;

/// Folds a table into `product_id -> {other column -> value}`.
/// A repeated product_id replaces the earlier row.
pub fn read_keyed(path: &Path, kind: TableKind) -> Result<KeyedRows, ApiError> {
    let table = read_table(path)?;
    let key_idx = table.column(kind, "product_id")?;

    let mut keyed = HashMap::with_capacity(table.rows.len());
    for row in &table.rows {
        let Some(product_id) = row.get(key_idx) else {
            continue;
        };
        let fields = table
            .headers
            .iter()
            .zip(row.iter())
            .enumerate()
            .filter(|(idx, _)| *idx != key_idx)
            .map(|(_, (header, value))| (header.to_string(), value.to_string()))
            .collect();
        keyed.insert(product_id.to_string(), fields);
    }
    Ok(keyed)
}
