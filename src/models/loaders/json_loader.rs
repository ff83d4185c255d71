use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{AppError, AppResult};
use crate::models::comic::Comic;

/// 从 JSON 文件加载漫画记录
pub async fn load_comic_file(path: &Path) -> AppResult<Comic> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::io(path.display().to_string(), e))?;

    let comic: Comic = serde_json::from_str(&content)?;
    Ok(comic)
}

/// 写入漫画记录
///
/// 先写临时文件再 rename，避免读到写了一半的文件
pub async fn save_comic_file(path: &Path, comic: &Comic) -> AppResult<()> {
    let content = serde_json::to_string_pretty(comic)?;
    let tmp_path = path.with_extension("json.tmp");

    fs::write(&tmp_path, content)
        .await
        .map_err(|e| AppError::io(tmp_path.display().to_string(), e))?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AppError::io(path.display().to_string(), e))?;

    Ok(())
}

/// 从文件夹中加载所有漫画记录
///
/// 单个文件损坏只记录警告，不影响其他记录
pub async fn load_all_comic_files(folder: &Path) -> AppResult<Vec<Comic>> {
    let folder = PathBuf::from(folder);

    if !folder.exists() {
        return Ok(Vec::new());
    }

    let mut comics = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::io(folder.display().to_string(), e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::io(folder.display().to_string(), e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        match load_comic_file(&path).await {
            Ok(comic) => comics.push(comic),
            Err(e) => {
                tracing::warn!("加载漫画记录失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(comics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::comic::{ComicStatus, NewComic};
    use crate::models::humor::HumorStyle;

    fn comic(id: &str) -> Comic {
        Comic::from_new(
            id,
            NewComic {
                title: "Gravity".to_string(),
                topic: "Physics".to_string(),
                humor_style: HumorStyle::Puns,
                page_count: 4,
                uploaded_file_url: "file:///tmp/g.md".to_string(),
                status: ComicStatus::Uploading,
            },
            chrono::Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_save_then_load_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();

        save_comic_file(&dir.path().join("a.json"), &comic("a"))
            .await
            .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loaded = load_all_comic_files(dir.path()).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "a");
        assert!(!dir.path().join("a.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_folder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_all_comic_files(&dir.path().join("nope")).await.unwrap();
        assert!(loaded.is_empty());
    }
}
