use serde::{Deserialize, Serialize};

pub const WORKSPACE_MIME_PREFIX: &str = "application/vnd.google-apps.";
pub const MIME_DOCUMENT: &str = "application/vnd.google-apps.document";
pub const MIME_SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
pub const MIME_PRESENTATION: &str = "application/vnd.google-apps.presentation";

/// Workspace-native files have no binary content of their own
pub fn is_workspace_native(mime_type: &str) -> bool {
    mime_type.starts_with(WORKSPACE_MIME_PREFIX)
}

/// office format a Workspace document is exported to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    pub mime_type: &'static str,
    /// including the leading dot
    pub extension: &'static str,
}

impl ExportFormat {
    pub fn for_mime(mime_type: &str) -> Option<Self> {
        match mime_type {
            MIME_DOCUMENT => Some(Self {
                mime_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                extension: ".docx",
            }),
            MIME_SPREADSHEET => Some(Self {
                mime_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                extension: ".xlsx",
            }),
            MIME_PRESENTATION => Some(Self {
                mime_type: "application/vnd.openxmlformats-officedocument.presentationml.presentation",
                extension: ".pptx",
            }),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Owner,
    Organizer,
    FileOrganizer,
    Writer,
    Commenter,
    Reader,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalType {
    User,
    Group,
    Domain,
    Anyone,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub display_name: Option<String>,
    pub email_address: Option<String>,
}

/// https://developers.google.com/drive/api/reference/rest/v3/permissions
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: String,
    #[serde(rename = "type")]
    pub principal: PrincipalType,
    pub role: Role,
    pub email_address: Option<String>,
    #[serde(default)]
    pub pending_owner: bool,
}

impl Permission {
    /// a user invited to take ownership who has not accepted yet.
    /// Drive reports the invitee as a writer until the transfer completes,
    /// so `writer` matches as well as `owner`
    pub fn is_pending_owner(&self) -> bool {
        self.principal == PrincipalType::User
            && self.pending_owner
            && matches!(self.role, Role::Owner | Role::Writer)
    }
}

/// body of a permission create request
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewPermission {
    #[serde(rename = "type")]
    pub principal: PrincipalType,
    pub role: Role,
    pub email_address: String,
}

/// https://developers.google.com/drive/api/reference/rest/v3/files
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub owners: Vec<User>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct FileList {
    #[serde(default)]
    pub files: Vec<FileRecord>,
    pub next_page_token: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(super) struct PermissionList {
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// quota values are int64 encoded as strings
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageQuota {
    pub limit: Option<String>,
    pub usage: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct About {
    pub user: User,
    pub storage_quota: Option<StorageQuota>,
}
