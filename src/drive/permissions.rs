use log::debug;
use serde_json::json;

use super::{DriveClient, NewPermission, Permission, PermissionList, Result, Role};

pub(super) const PERMISSION_FIELDS: &str = "id, type, role, emailAddress, pendingOwner";

impl DriveClient {
    fn permissions_url(&self, file_id: &str) -> String {
        format!("{}/permissions", self.file_url(file_id))
    }

    pub async fn list_permissions(&self, file_id: &str) -> Result<Vec<Permission>> {
        let req = self
            .client
            .get(self.permissions_url(file_id))
            .query(&[("fields", format!("permissions({})", PERMISSION_FIELDS))]);
        let list: PermissionList = self.send(req).await?.json().await?;
        Ok(list.permissions)
    }

    pub async fn create_permission(
        &self,
        file_id: &str,
        permission: &NewPermission,
        transfer_ownership: bool,
        send_notification_email: bool,
    ) -> Result<Permission> {
        debug!("Creating {:?} permission on {} for {}", permission.role, file_id, permission.email_address);
        let req = self
            .client
            .post(self.permissions_url(file_id))
            .query(&[
                ("transferOwnership", transfer_ownership.to_string().as_str()),
                ("sendNotificationEmail", send_notification_email.to_string().as_str()),
                ("fields", PERMISSION_FIELDS),
            ])
            .json(permission);
        Ok(self.send(req).await?.json().await?)
    }

    pub async fn update_permission(
        &self,
        file_id: &str,
        permission_id: &str,
        role: Role,
        transfer_ownership: bool,
    ) -> Result<Permission> {
        debug!("Updating permission {} on {} to {:?}", permission_id, file_id, role);
        let req = self
            .client
            .patch(format!("{}/{}", self.permissions_url(file_id), permission_id))
            .query(&[
                ("transferOwnership", transfer_ownership.to_string().as_str()),
                ("fields", PERMISSION_FIELDS),
            ])
            .json(&json!({ "role": role }));
        Ok(self.send(req).await?.json().await?)
    }
}
