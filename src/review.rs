use crate::error::ApiError;
use crate::model::{Label, ModelVariant, TableKind};
use crate::session::SessionStore;
use crate::table::{read_keyed, read_table, write_table};
use crate::types::{LabelCounts, ResultItem, ResultsResponse, StatusResponse, TableState};


pub fn status(store: &SessionStore, session_id: &str, model: ModelVariant) -> StatusResponse {
    let state = |kind| TableState::from_exists(store.table_exists(session_id, model, kind));
    StatusResponse {
        video_description: state(TableKind::VideoDescription),
        product_info: state(TableKind::ProductInfo),
        judgement: state(TableKind::Judgement),
    }
}


/// Left join of the judgement table against video descriptions and product
/// info, keyed by product_id. Items keep judgement file order.
pub fn aggregate(
    store: &SessionStore,
    session_id: &str,
    model: ModelVariant,
) -> Result<ResultsResponse, ApiError> {
    if !TableKind::ALL
        .iter()
        .all(|&kind| store.table_exists(session_id, model, kind))
    {
        return Err(ApiError::PrerequisiteMissing(
            "Not all required CSV files exist".to_string(),
        ));
    }

    let descriptions = read_keyed(
        &store.table_path(session_id, model, TableKind::VideoDescription),
        TableKind::VideoDescription,
    )?;
    let product_infos = read_keyed(
        &store.table_path(session_id, model, TableKind::ProductInfo),
        TableKind::ProductInfo,
    )?;

    let mut reader =
        csv::Reader::from_path(store.table_path(session_id, model, TableKind::Judgement))?;
    let mut counts = LabelCounts::default();
    let mut items = Vec::new();

    for record in reader.deserialize::<ResultItem>() {
        let mut item = record?;
        item.video_description = descriptions
            .get(&item.product_id)
            .cloned()
            .unwrap_or_default();
        item.product_info = product_infos
            .get(&item.product_id)
            .cloned()
            .unwrap_or_default();
        counts.record(&item.label);
        items.push(item);
    }

    Ok(ResultsResponse { counts, items })
}


/// Rewrites the label of every judgement row with `product_id`, keeping the
/// header's column order. Returns how many rows matched; zero is not an error
/// and leaves the file untouched.
pub fn override_label(
    store: &SessionStore,
    session_id: &str,
    model: ModelVariant,
    product_id: &str,
    new_label: Label,
) -> Result<usize, ApiError> {
    let path = store.table_path(session_id, model, TableKind::Judgement);
    if !path.is_file() {
        return Err(ApiError::TableNotFound("Judgement CSV not found".to_string()));
    }

    let mut table = read_table(&path)?;
    if table.rows.is_empty() {
        return Ok(0);
    }

    let id_idx = table.column(TableKind::Judgement, "product_id")?;
    let label_idx = table.column(TableKind::Judgement, "label")?;

    let mut matched = 0;
    for row in table.rows.iter_mut() {
        if row.get(id_idx) != Some(product_id) {
            continue;
        }
        *row = row
            .iter()
            .enumerate()
            .map(|(idx, field)| if idx == label_idx { new_label.as_str() } else { field })
            .collect();
        matched += 1;
    }

    if matched > 0 {
        write_table(&path, &table.headers, &table.rows)?;
    }
    Ok(matched)
}
