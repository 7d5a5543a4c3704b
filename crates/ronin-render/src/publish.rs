//! 원자적 파일 게시.
//!
//! 모든 산출물을 같은 디렉토리의 임시 파일에 먼저 쓰고, 전부 성공한 뒤에만
//! rename으로 교체합니다. 같은 파일시스템 안의 rename은 원자적이므로
//! OBS는 항상 이전 파일 또는 완성된 새 파일만 읽습니다.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RenderError, RenderResult};

/// 출력 디렉토리에 산출물을 게시합니다.
#[derive(Debug, Clone)]
pub struct Publisher {
    dir: PathBuf,
}

impl Publisher {
    /// 새 게시자를 생성합니다.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 출력 디렉토리.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 파일의 게시 경로.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// 출력 디렉토리가 없으면 생성합니다.
    pub fn ensure_dir(&self) -> RenderResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| RenderError::io(&self.dir, e))
    }

    /// 여러 파일을 한 묶음으로 게시합니다.
    ///
    /// 임시 파일 작성 중 하나라도 실패하면 이미 작성한 임시 파일을 지우고
    /// 에러를 반환하며, 게시된 파일은 그대로 남습니다.
    pub fn publish(&self, files: &[(&str, &[u8])]) -> RenderResult<()> {
        self.ensure_dir()?;

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());
        for (name, contents) in files {
            let tmp = self.temp_path(name);
            if let Err(e) = write_synced(&tmp, contents) {
                let _ = fs::remove_file(&tmp);
                discard(&staged);
                return Err(e);
            }
            staged.push((tmp, self.path_of(name)));
        }

        for (i, (tmp, target)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(tmp, target) {
                discard(&staged[i..]);
                return Err(RenderError::io(target, e));
            }
        }

        debug!(dir = %self.dir.display(), files = files.len(), "산출물 게시 완료");
        Ok(())
    }

    /// 블로킹 게시를 별도 스레드에서 실행합니다.
    pub async fn publish_owned(&self, files: Vec<(&'static str, Vec<u8>)>) -> RenderResult<()> {
        let publisher = self.clone();
        tokio::task::spawn_blocking(move || {
            let borrowed: Vec<(&str, &[u8])> =
                files.iter().map(|(n, c)| (*n, c.as_slice())).collect();
            publisher.publish(&borrowed)
        })
        .await
        .map_err(|e| RenderError::Task(e.to_string()))?
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!(".{}.{}.tmp", name, std::process::id()))
    }
}

fn write_synced(path: &Path, contents: &[u8]) -> RenderResult<()> {
    let mut file = File::create(path).map_err(|e| RenderError::io(path, e))?;
    file.write_all(contents)
        .and_then(|_| file.sync_all())
        .map_err(|e| RenderError::io(path, e))
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_replaces_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(dir.path().join("assets"));

        publisher
            .publish(&[("a.txt", "first".as_bytes()), ("b.txt", "first".as_bytes())])
            .unwrap();
        publisher
            .publish(&[("a.txt", "second".as_bytes()), ("b.txt", "second".as_bytes())])
            .unwrap();

        assert_eq!(fs::read(publisher.path_of("a.txt")).unwrap(), b"second");
        assert_eq!(fs::read(publisher.path_of("b.txt")).unwrap(), b"second");

        let leftovers: Vec<_> = fs::read_dir(publisher.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_failed_staging_keeps_previous_files() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(dir.path());
        publisher.publish(&[("a.txt", "old".as_bytes())]).unwrap();

        // 디렉토리 이름과 충돌하는 임시 파일 경로는 생성할 수 없음
        let blocked = format!(".b.txt.{}.tmp", std::process::id());
        fs::create_dir(dir.path().join(blocked)).unwrap();

        let result = publisher.publish(&[("a.txt", "new".as_bytes()), ("b.txt", "new".as_bytes())]);
        assert!(result.is_err());
        assert_eq!(fs::read(publisher.path_of("a.txt")).unwrap(), b"old");
        assert!(!publisher.path_of("b.txt").exists());
    }

    #[tokio::test]
    async fn test_publish_owned() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(dir.path());
        publisher
            .publish_owned(vec![("c.txt", b"async".to_vec())])
            .await
            .unwrap();
        assert_eq!(fs::read(publisher.path_of("c.txt")).unwrap(), b"async");
    }
}
