pub const MIN_PASSWORD_LEN: usize = 4;

/// Strict-enough address check for subscriptions: `local@domain.tld`,
/// no whitespace.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// Accepted upload content types.
#[must_use]
pub fn is_image_mime(content_type: &str) -> bool {
    matches!(
        content_type.to_ascii_lowercase().as_str(),
        "image/png" | "image/jpeg" | "image/jpg" | "image/webp" | "image/gif"
    )
}

/// Replaces anything outside `[A-Za-z0-9._-]` so an uploaded filename is
/// safe to drop into the uploads directory.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_replacement = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
            out.push(c);
            last_was_replacement = false;
        } else if !last_was_replacement {
            out.push('_');
            last_was_replacement = true;
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

/// Applies a listing's default and hard cap; non-positive requests fall back
/// to the default.
#[must_use]
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.filter(|l| *l > 0).unwrap_or(default).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@"));
    }

    #[test]
    fn test_is_image_mime() {
        assert!(is_image_mime("image/png"));
        assert!(is_image_mime("image/JPEG"));
        assert!(is_image_mime("image/webp"));
        assert!(!is_image_mime("text/html"));
        assert!(!is_image_mime("application/pdf"));
        assert!(!is_image_mime("image/svg+xml"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("photo.png"), "photo.png");
        assert_eq!(sanitize_filename("my photo (1).png"), "my_photo_1_.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("émoji🦀.gif"), "_moji_.gif");
        assert_eq!(sanitize_filename(""), "_");
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 20, 100), 20);
        assert_eq!(clamp_limit(Some(50), 20, 100), 50);
        assert_eq!(clamp_limit(Some(500), 20, 100), 100);
        assert_eq!(clamp_limit(Some(0), 20, 100), 20);
        assert_eq!(clamp_limit(Some(-3), 20, 100), 20);
    }
}
