use std::path::Path;

use anyhow::anyhow;
use arrow_array::{
    FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray,
};
use futures::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};

use passage_core::error::{Error, Result};
use passage_core::types::{Chunk, ChunkId, SearchHit};

use crate::schema::entries_schema;
use crate::table;

const META_TABLE: &str = "meta";
const SEQ_KEY: &str = "next_seq";
const EMBEDDER_KEY: &str = "embedder_id";
const DIM_KEY: &str = "dimension";
// Over-retrieval factor before the deterministic re-sort; equal-distance
// entries at the k boundary would otherwise be cut arbitrarily.
const OVERFETCH: usize = 10;

/// One stored row of the entries table.
#[derive(Debug, Clone)]
struct StoredEntry {
    id: String,
    seq: i64,
    text: String,
    source_offset: i64,
    vector: Vec<f32>,
}

/// Persistent cosine-distance vector index.
///
/// The similarity metric is fixed for the lifetime of an index; so are the
/// embedder identity and vector width, both pinned in the metadata table on
/// first open. `insert` and `clear` serialize against each other behind an
/// internal lock; `search` and `count` take no lock.
pub struct VectorIndex {
    conn: Connection,
    table: String,
    dim: usize,
    write_lock: tokio::sync::Mutex<()>,
}

impl VectorIndex {
    /// Open or create the store at `path`. Idempotent: reopening an existing
    /// index is a no-op, except that an `embedder_id` or dimension differing
    /// from the pinned one is rejected.
    pub async fn open(path: &Path, table: &str, embedder_id: &str, dim: usize) -> Result<Self> {
        let conn = table::open_db(path.to_string_lossy().as_ref()).await?;
        table::ensure_table(&conn, table, entries_schema(dim as i32)).await?;
        table::ensure_meta_table(&conn, META_TABLE).await?;

        let embedder_key = format!("{EMBEDDER_KEY}:{table}");
        let dim_key = format!("{DIM_KEY}:{table}");
        match table::get_meta(&conn, META_TABLE, &embedder_key).await? {
            Some(pinned) if pinned != embedder_id => {
                return Err(anyhow!(
                    "index at {} was built with embedder '{}', refusing to open with '{}'; \
                     clear the index directory or fix the configuration",
                    path.display(),
                    pinned,
                    embedder_id
                )
                .into());
            }
            Some(_) => {}
            None => {
                table::set_meta(&conn, META_TABLE, &embedder_key, embedder_id).await?;
                table::set_meta(&conn, META_TABLE, &dim_key, &dim.to_string()).await?;
            }
        }
        if let Some(pinned) = table::get_meta(&conn, META_TABLE, &dim_key).await? {
            let pinned: usize = pinned.parse().map_err(|_| anyhow!("corrupt dimension metadata"))?;
            if pinned != dim {
                return Err(Error::DimensionMismatch { expected: pinned, actual: dim });
            }
        }

        Ok(Self {
            conn,
            table: table.to_string(),
            dim,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Insert chunks with their embeddings, assigning ids from the persisted
    /// sequence. Returns the assigned ids in input order.
    pub async fn insert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<Vec<ChunkId>> {
        let _guard = self.write_lock.lock().await;
        if chunks.len() != embeddings.len() {
            return Err(anyhow!(
                "{} chunks with {} embeddings; lengths must match",
                chunks.len(),
                embeddings.len()
            )
            .into());
        }
        for embedding in embeddings {
            if embedding.len() != self.dim {
                return Err(Error::DimensionMismatch {
                    expected: self.dim,
                    actual: embedding.len(),
                });
            }
        }
        if chunks.is_empty() {
            return Ok(vec![]);
        }
        self.insert_inner(chunks, embeddings).await.map_err(Error::from)
    }

    async fn insert_inner(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> anyhow::Result<Vec<ChunkId>> {
        // Reserve the id range before writing rows: a crash mid-insert leaves
        // a gap in the sequence, never a duplicate id.
        let base = self.next_seq().await?;
        table::set_meta(
            &self.conn,
            META_TABLE,
            &format!("{SEQ_KEY}:{}", self.table),
            &(base + chunks.len() as i64).to_string(),
        )
        .await?;

        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );

        let batch_size = 1000usize;
        let mut ids = Vec::with_capacity(chunks.len());
        let mut pending = Vec::new();
        for (i, (chunk, embedding)) in chunks.iter().zip(embeddings.iter()).enumerate() {
            let seq = base + i as i64;
            let id = format!("chunk_{seq}");
            ids.push(id.clone());
            pending.push(StoredEntry {
                id,
                seq,
                text: chunk.text.clone(),
                source_offset: chunk.source_offset as i64,
                vector: embedding.clone(),
            });
            pb.set_position((i + 1) as u64);
            if pending.len() >= batch_size || i == chunks.len() - 1 {
                self.write_batch(&pending).await?;
                pending.clear();
            }
        }
        pb.finish_with_message("indexed");
        Ok(ids)
    }

    async fn write_batch(&self, entries: &[StoredEntry]) -> anyhow::Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let record_batch = self.entries_to_record_batch(entries)?;
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
        let tbl = self.conn.open_table(&self.table).execute().await?;
        tbl.add(reader).execute().await?;
        Ok(())
    }

    fn entries_to_record_batch(&self, entries: &[StoredEntry]) -> anyhow::Result<RecordBatch> {
        let schema = entries_schema(self.dim as i32);
        let mut ids = Vec::new();
        let mut seqs = Vec::new();
        let mut texts = Vec::new();
        let mut offsets = Vec::new();
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
        for entry in entries {
            ids.push(entry.id.clone());
            seqs.push(entry.seq);
            texts.push(entry.text.clone());
            offsets.push(entry.source_offset);
            vectors.push(Some(entry.vector.iter().map(|&x| Some(x)).collect()));
        }
        let record_batch = RecordBatch::try_new(
            schema,
            vec![
                std::sync::Arc::new(StringArray::from(ids)),
                std::sync::Arc::new(Int64Array::from(seqs)),
                std::sync::Arc::new(StringArray::from(texts)),
                std::sync::Arc::new(Int64Array::from(offsets)),
                std::sync::Arc::new(FixedSizeListArray::from_iter_primitive::<
                    arrow_array::types::Float32Type,
                    _,
                    _,
                >(vectors.into_iter(), self.dim as i32)),
            ],
        )?;
        Ok(record_batch)
    }

    /// Up to `k` entries ordered by ascending cosine distance
    /// (`1 - cosine_similarity`), ties broken by insertion order. An empty
    /// index returns an empty result.
    pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(anyhow!("k must be positive").into());
        }
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        self.search_inner(query, k).await.map_err(Error::from)
    }

    async fn search_inner(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>> {
        let tbl = self.conn.open_table(&self.table).execute().await?;
        let mut stream = tbl
            .vector_search(query.to_vec())?
            .distance_type(DistanceType::Cosine)
            .limit(k * OVERFETCH)
            .execute()
            .await?;

        let mut hits: Vec<(f32, i64, SearchHit)> = Vec::new();
        while let Some(batch) = TryStreamExt::try_next(&mut stream).await? {
            let id_col = batch
                .column_by_name("id")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| anyhow!("id column missing"))?;
            let seq_col = batch
                .column_by_name("seq")
                .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
                .ok_or_else(|| anyhow!("seq column missing"))?;
            let text_col = batch
                .column_by_name("text")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| anyhow!("text column missing"))?;
            let dist_col = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| anyhow!("_distance column missing"))?;
            for i in 0..batch.num_rows() {
                let distance = dist_col.value(i);
                hits.push((
                    distance,
                    seq_col.value(i),
                    SearchHit {
                        id: id_col.value(i).to_string(),
                        text: text_col.value(i).to_string(),
                        distance,
                    },
                ));
            }
        }

        hits.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        Ok(hits.into_iter().take(k).map(|(_, _, hit)| hit).collect())
    }

    /// Drop all entries. The index stays usable and the id sequence is not
    /// reset, so ids remain unique across clears.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.clear_inner().await.map_err(Error::from)
    }

    async fn clear_inner(&self) -> anyhow::Result<()> {
        self.conn.drop_table(&self.table, &[]).await?;
        table::ensure_table(&self.conn, &self.table, entries_schema(self.dim as i32)).await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<usize> {
        let tbl = self
            .conn
            .open_table(&self.table)
            .execute()
            .await
            .map_err(anyhow::Error::from)?;
        let count = tbl.count_rows(None).await.map_err(anyhow::Error::from)?;
        Ok(count)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    async fn next_seq(&self) -> anyhow::Result<i64> {
        match table::get_meta(&self.conn, META_TABLE, &format!("{SEQ_KEY}:{}", self.table)).await? {
            Some(raw) => raw.parse().map_err(|_| anyhow!("corrupt id sequence metadata")),
            None => Ok(0),
        }
    }
}
