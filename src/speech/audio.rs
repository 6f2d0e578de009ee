use mime::Mime;

/// Audio content type for an upstream reply, or `None` if it is not audio.
///
/// A declared `audio/*` type is trusted. A missing or generic
/// `application/octet-stream` header falls back to magic-byte sniffing.
#[must_use]
pub fn audio_content_type(header: Option<&str>, body: &[u8]) -> Option<String> {
    if let Some(raw) = header.map(str::trim).filter(|raw| !raw.is_empty()) {
        let declared: Mime = raw.parse().ok()?;
        if declared.type_() == mime::AUDIO {
            return Some(declared.essence_str().to_string());
        }
        if declared != mime::APPLICATION_OCTET_STREAM {
            return None;
        }
    }
    sniff_audio(body)
}

#[must_use]
pub fn sniff_audio(body: &[u8]) -> Option<String> {
    infer::get(body)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Audio)
        .map(|kind| kind.mime_type().to_string())
}
