//! Profile operations. Responses come wrapped in `{ "data": ... }`.

use super::*;

use crate::dispatch::MultipartBody;

impl ApiClient {
    pub async fn create_profile(&self, payload: &CreateProfile) -> Result<Profile, ApiError> {
        let req = ApiRequest::post(self.url("/profile")).json(payload)?;
        let body = self.execute(&req, "could not create profile").await?;
        decode_data(&body)
    }

    pub async fn profile(&self) -> Result<Profile, ApiError> {
        let req = ApiRequest::get(self.url("/profile"));
        let body = self.execute(&req, "could not load profile").await?;
        decode_data(&body)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ApiError> {
        let req = ApiRequest::put(self.url("/profile")).json(update)?;
        let body = self.execute(&req, "could not update profile").await?;
        decode_data(&body)
    }

    /// Uploads an avatar image as multipart field `avatar`.
    pub async fn upload_avatar(
        &self,
        file_name: &str,
        mime: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<AvatarUpload, ApiError> {
        let form = MultipartBody::new().file("avatar", file_name, mime, bytes);
        let req = ApiRequest::post(self.url("/profile/avatar")).multipart(form);
        let body = self.execute(&req, "could not upload avatar").await?;
        decode_data(&body)
    }

    pub async fn delete_avatar(&self) -> Result<(), ApiError> {
        let req = ApiRequest::delete(self.url("/profile/avatar"));
        self.execute(&req, "could not delete avatar").await?;
        Ok(())
    }
}
