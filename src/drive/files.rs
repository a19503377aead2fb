use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use log::{debug, warn};
use tokio::{
    fs::{remove_file, rename, File},
    io::AsyncWriteExt,
};

use super::{is_workspace_native, DriveClient, DriveError, ExportFormat, FileList, FileRecord, Result};

pub(super) const FILE_FIELDS: &str = "id, name, mimeType, owners(displayName, emailAddress), \
permissions(id, type, role, emailAddress, pendingOwner)";

/// Which files to list. Only the first page is ever fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct FileQuery {
    pub parent: Option<String>,
    pub include_trashed: bool,
    pub page_size: u32,
}

impl Default for FileQuery {
    fn default() -> Self {
        Self {
            parent: None,
            include_trashed: false,
            page_size: 1000,
        }
    }
}

impl FileQuery {
    pub fn in_folder(folder_id: impl Into<String>) -> Self {
        Self {
            parent: Some(folder_id.into()),
            ..Self::default()
        }
    }

    /// the `q` search expression, if any clause applies
    fn search(&self) -> Option<String> {
        let mut clauses = vec![];
        if let Some(parent) = &self.parent {
            clauses.push(format!("'{}' in parents", parent.replace('\\', "\\\\").replace('\'', "\\'")));
        }
        if !self.include_trashed {
            clauses.push("trashed = false".to_string());
        }
        if clauses.is_empty() { None } else { Some(clauses.join(" and ")) }
    }
}

/// where a download lands and whether it goes through export
pub fn download_target(file: &FileRecord, dir: &Path) -> Result<(Option<ExportFormat>, PathBuf)> {
    // drive names may contain path separators
    let name = file.name.replace(['/', '\\'], "_");
    match ExportFormat::for_mime(&file.mime_type) {
        Some(format) => Ok((Some(format), dir.join(format!("{}{}", name, format.extension)))),
        None if is_workspace_native(&file.mime_type) => {
            Err(DriveError::NotDownloadable(file.mime_type.clone()))
        }
        None => Ok((None, dir.join(name))),
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

impl DriveClient {
    pub async fn list_files(&self, query: &FileQuery) -> Result<Vec<FileRecord>> {
        let mut req = self.client.get(self.files_url()).query(&[
            ("pageSize", query.page_size.to_string()),
            ("fields", format!("nextPageToken, files({})", FILE_FIELDS)),
        ]);
        if let Some(q) = query.search() {
            debug!("Listing files matching {}", q);
            req = req.query(&[("q", q)]);
        }

        let list: FileList = self.send(req).await?.json().await?;
        if list.next_page_token.is_some() {
            warn!("More than {} files matched; only the first page is shown", query.page_size);
        }
        Ok(list.files)
    }

    pub async fn get_file(&self, file_id: &str) -> Result<FileRecord> {
        let req = self
            .client
            .get(self.file_url(file_id))
            .query(&[("fields", FILE_FIELDS)]);
        Ok(self.send(req).await?.json().await?)
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.send(self.client.delete(self.file_url(file_id))).await?;
        Ok(())
    }

    /// Download a file into `dir`, exporting Workspace documents to office
    /// formats. Returns the written path.
    pub async fn download(&self, file: &FileRecord, dir: &Path, progress: &ProgressBar) -> Result<PathBuf> {
        let (export, path) = download_target(file, dir)?;
        let req = match export {
            Some(format) => {
                debug!("Exporting {} as {}", file.id, format.mime_type);
                self.client
                    .get(format!("{}/export", self.file_url(&file.id)))
                    .query(&[("mimeType", format.mime_type)])
            }
            None => self.client.get(self.file_url(&file.id)).query(&[("alt", "media")]),
        };

        let mut res = self.send(req).await?;
        if let Some(len) = res.content_length() {
            progress.set_length(len);
        }

        // an existing file at `path` is only replaced by a complete download
        let partial = partial_path(&path);
        let written = async {
            let mut out = File::create(&partial).await?;
            while let Some(chunk) = res.chunk().await? {
                out.write_all(&chunk).await?;
                progress.inc(chunk.len() as u64);
            }
            out.flush().await?;
            Ok::<_, DriveError>(())
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = remove_file(&partial).await {
                debug!("Could not remove {}: {}", partial.display(), cleanup);
            }
            return Err(e);
        }
        rename(&partial, &path).await?;

        Ok(path)
    }
}
