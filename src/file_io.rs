use hexflower_image::inline_bytes;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, File, HtmlAnchorElement, Response, Url};

pub(crate) fn create_object_url(bytes: &[u8], mime: &str) -> Result<String, JsValue> {
    let array = js_sys::Array::new();
    let u8_array = js_sys::Uint8Array::from(bytes);
    array.push(&u8_array.buffer());
    let options = BlobPropertyBag::new();
    if !mime.trim().is_empty() {
        options.set_type(mime);
    }
    let blob = Blob::new_with_u8_array_sequence_and_options(&array, &options)?;
    Url::create_object_url_with_blob(&blob)
}

/// Hands `bytes` to the browser as a download named `file_name`.
pub(crate) fn download_bytes(file_name: &str, bytes: &[u8], mime: &str) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let url = create_object_url(bytes, mime)?;
    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();
    let _ = Url::revoke_object_url(&url);
    Ok(())
}

pub(crate) async fn read_file_bytes(file: File) -> Result<Vec<u8>, String> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|_| "failed to read file".to_string())?;
    let array = js_sys::Uint8Array::new(&buffer);
    Ok(array.to_vec())
}

pub(crate) async fn read_file_text(file: File) -> Result<String, String> {
    let value = JsFuture::from(file.text())
        .await
        .map_err(|_| "failed to read file".to_string())?;
    value.as_string().ok_or_else(|| "file is not text".to_string())
}

/// Fetches an image reference and returns it as a data URI. The response's
/// content type is only used when the bytes are not a known image format.
pub(crate) async fn fetch_data_uri(reference: String) -> Result<String, String> {
    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    let response = JsFuture::from(window.fetch_with_str(&reference))
        .await
        .map_err(|err| format!("fetch failed: {err:?}"))?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| "unexpected fetch result".to_string())?;
    if !response.ok() {
        return Err(format!("HTTP {}", response.status()));
    }
    let content_type = response.headers().get("content-type").ok().flatten();
    let buffer = response
        .array_buffer()
        .map_err(|_| "unreadable response body".to_string())?;
    let buffer = JsFuture::from(buffer)
        .await
        .map_err(|_| "unreadable response body".to_string())?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    Ok(inline_bytes(&bytes, content_type.as_deref()))
}
