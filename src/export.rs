
use ndarray::Array2;
use ndarray_npy::write_npy;
use std::fs::{self, File};
use std::hash::Hash;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use crate::error::Result;
use crate::store::VectorStore;
use crate::vectors::Vector;

pub trait SaveFile {
    fn save_file(&self, output_dir: &Path, file_name: &str) -> Result<()>;
}

impl SaveFile for Array2<f32> {
    fn save_file(&self, output_dir: &Path, file_name: &str) -> Result<()> {
        write_npy(output_dir.join(format!("{}.npy", file_name)), self)?;
        Ok(())
    }
}

impl SaveFile for Vec<String> {
    fn save_file(&self, output_dir: &Path, file_name: &str) -> Result<()> {
        let f = BufWriter::new(File::create(output_dir.join(format!("{}.json", file_name)))?);
        serde_json::to_writer(f, self)?;
        Ok(())
    }
}

pub fn save_output<S: SaveFile>(output_dir: impl AsRef<Path>, file_name: &str, item: &S) -> Result<()> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;
    item.save_file(output_dir, file_name)
}

/// Stacks vectors into a matrix, one row per vector.
pub fn to_matrix<V: Vector>(vectors: &[&V]) -> Array2<f32> {
    let dimension = vectors.first().map(|v| v.dimension()).unwrap_or(0);
    let mut matrix = Array2::zeros((vectors.len(), dimension));
    for (mut row, vector) in matrix.rows_mut().into_iter().zip(vectors) {
        row.assign(&vector.to_array());
    }
    matrix
}

/// Writes `<name>.npy` with the vectors as rows and `<name>.json` with the matching labels.
pub fn write_labelled<V: Vector>(output_dir: impl AsRef<Path>, name: &str, rows: &[(String, &V)]) -> Result<()> {

    let labels: Vec<String> = rows.iter().map(|(label, _)| label.to_owned()).collect();
    let vectors: Vec<&V> = rows.iter().map(|(_, vector)| *vector).collect();

    save_output(&output_dir, name, &to_matrix(&vectors))?;
    save_output(&output_dir, name, &labels)?;
    info!("saved {} vectors as {}", labels.len(), name);
    Ok(())
}

/// Writes a whole store, rows sorted by key.
pub fn write_store<K, V>(output_dir: impl AsRef<Path>, name: &str, store: &VectorStore<K, V>) -> Result<()>
where
    K: Eq + Hash + Clone + Ord + ToString,
    V: Vector,
{
    let mut entries = store.entries();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    write_documents(output_dir, name, &entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect::<Vec<_>>())
}

pub fn write_documents<V: Vector>(output_dir: impl AsRef<Path>, name: &str, documents: &[(String, Arc<V>)]) -> Result<()> {
    let rows: Vec<(String, &V)> = documents.iter().map(|(id, vector)| (id.to_owned(), vector.as_ref())).collect();
    write_labelled(output_dir, name, &rows)
}

/// Number vectors are labelled by the number they stand for, starting at 1.
pub fn write_number_vectors<V: Vector>(output_dir: impl AsRef<Path>, name: &str, number_vectors: &[V]) -> Result<()> {
    let rows: Vec<(String, &V)> = number_vectors.iter().enumerate().map(|(i, vector)| ((i + 1).to_string(), vector)).collect();
    write_labelled(output_dir, name, &rows)
}
