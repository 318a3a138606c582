use rusqlite::params;
use color_eyre::Result;
use super::entities::MediaAsset;
use super::mappers::{map_media, MEDIA_FIELDS};
use super::{execute, select_many, select_one, Pool};

pub fn insert_media(pool: &Pool, media: &mut MediaAsset) -> Result<()> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO media (file_name, file_path, url, file_size, mime_type, \
    width, height, duration, alt_text, uploaded_by, created_at) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    params![
      media.file_name,
      media.file_path,
      media.url,
      media.file_size,
      media.mime_type,
      media.width,
      media.height,
      media.duration,
      media.alt_text,
      media.uploaded_by,
      media.created_at
    ]
  )?;
  media.id = conn.last_insert_rowid();
  Ok(())
}

// mime_prefix is something like "image/" for the media
// manager tabs.
pub fn media_page(
  pool: &Pool,
  mime_prefix: Option<&str>,
  offset: i64,
  limit: i64
) -> Result<Vec<MediaAsset>> {
  select_many(
    pool,
    &format!(
      "SELECT {} FROM media WHERE (?1 IS NULL OR substr(mime_type, 1, length(?1)) = ?1) \
      ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
      MEDIA_FIELDS
    ),
    params![mime_prefix, limit, offset],
    map_media
  )
}

pub fn media_count(pool: &Pool, mime_prefix: Option<&str>) -> Result<i64> {
  let count: Option<i64> = select_one(
    pool,
    "SELECT count(*) FROM media WHERE (?1 IS NULL OR substr(mime_type, 1, length(?1)) = ?1)",
    params![mime_prefix],
    |row| row.get(0)
  )?;
  Ok(count.unwrap_or(0))
}

pub fn media_by_id(pool: &Pool, id: i64) -> Result<Option<MediaAsset>> {
  select_one(
    pool,
    &format!("SELECT {} FROM media WHERE id = ?", MEDIA_FIELDS),
    params![id],
    map_media
  )
}

pub fn delete_media(pool: &Pool, id: i64) -> Result<bool> {
  let changed = execute(pool, "DELETE FROM media WHERE id = ?", params![id])?;
  Ok(changed > 0)
}
