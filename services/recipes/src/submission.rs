//! Request body extraction for recipe writes
//!
//! A write carries either a JSON object or a multipart form with optional
//! image. The image is validated and written to the managed directory while
//! the form is read.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request, multipart::MultipartError},
    http::{StatusCode, header::CONTENT_TYPE},
};
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult, internal},
    models::{FormValue, RecipeInput},
    state::AppState,
    upload::{IMAGE_FIELDS, ImageStore, StoredImage, extension_for},
};

/// A recipe payload plus the image that came with it, if any
#[derive(Debug)]
pub struct RecipeSubmission {
    pub input: RecipeInput,
    pub image: Option<StoredImage>,
}

#[async_trait]
impl FromRequest<AppState> for RecipeSubmission {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?;
            return read_form(multipart, &state.images).await;
        }

        let body = Bytes::from_request(req, state).await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::Validation("Request body too large".to_string())
            } else {
                ApiError::Validation(e.body_text())
            }
        })?;
        let input = serde_json::from_slice(&body)
            .map_err(|e| ApiError::Validation(format!("Invalid JSON body: {}", e)))?;

        Ok(Self { input, image: None })
    }
}

/// Read every form field, removing the stored image again if a later
/// field fails
async fn read_form(mut multipart: Multipart, images: &ImageStore) -> ApiResult<RecipeSubmission> {
    let mut input = RecipeInput::default();
    let mut image = None;

    let result = read_fields(&mut multipart, images, &mut input, &mut image).await;
    let result = images.settle(image.as_ref(), result).await;

    result.map(|()| RecipeSubmission { input, image })
}

async fn read_fields(
    multipart: &mut Multipart,
    images: &ImageStore,
    input: &mut RecipeInput,
    image: &mut Option<StoredImage>,
) -> ApiResult<()> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, images))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if IMAGE_FIELDS.contains(&name.as_str()) {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            let mut data = Vec::new();
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| multipart_error(e, images))?
            {
                if data.len() + chunk.len() > images.max_bytes() {
                    return Err(too_large(images));
                }
                data.extend_from_slice(&chunk);
            }

            // Browsers send an empty part when no file was picked; an empty
            // file is never stored whatever it is called
            if data.is_empty() {
                continue;
            }

            if image.is_some() {
                return Err(ApiError::Upload(
                    "Only one image may be uploaded per request".to_string(),
                ));
            }

            let content_type = content_type
                .filter(|ct| extension_for(ct).is_some())
                .ok_or_else(|| {
                    ApiError::Upload(
                        "Only JPEG, PNG, GIF and WebP images are allowed".to_string(),
                    )
                })?;

            let stored = images
                .save(file_name.as_deref(), &content_type, &data)
                .await
                .map_err(internal("Failed to store uploaded image"))?;
            *image = Some(stored);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| multipart_error(e, images))?;
        match name.as_str() {
            "title" => input.title = Some(value),
            "description" => input.description = Some(value),
            "prep_time" => input.prep_time = Some(FormValue::Text(value)),
            "rating" => input.rating = Some(FormValue::Text(value)),
            "img_url" => input.img_url = Some(value),
            _ => {}
        }
    }

    Ok(())
}

fn too_large(images: &ImageStore) -> ApiError {
    ApiError::Upload(format!(
        "Image too large. Maximum size is {} bytes",
        images.max_bytes()
    ))
}

fn multipart_error(e: MultipartError, images: &ImageStore) -> ApiError {
    warn!("Multipart read error: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(images)
    } else {
        ApiError::Validation(format!("Failed to read form data: {}", e.body_text()))
    }
}
