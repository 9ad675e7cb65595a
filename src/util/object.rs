use uuid::Uuid;

/// Object stores have no directories; a zero-byte object whose key ends in
/// "/" stands in for one.
pub fn directory_key(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

/// Extension of `name` including the leading dot, taken after the last '.'.
pub fn file_extension(name: &str) -> Option<&str> {
    name.rfind('.').map(|pos| &name[pos..])
}

/// A fresh 32 hex character identifier followed by the extension of
/// `original_name`. `None` when the name has no extension.
pub fn generate_file_name(original_name: &str) -> Option<String> {
    let extension = file_extension(original_name)?;
    Some(format!("{}{}", Uuid::new_v4().simple(), extension))
}

/// Unsigned path-style URL of `key`. Only the last path segment is
/// percent-encoded, so a space becomes `%20` rather than the `+` of HTML form
/// encoding.
pub fn object_url(endpoint: &str, bucket: &str, key: &str) -> Option<String> {
    if key.is_empty() {
        return None;
    }

    let endpoint = endpoint.trim_end_matches('/');
    let key = key.trim_start_matches('/');

    let (dir, name) = match key.rfind('/') {
        Some(pos) => key.split_at(pos + 1),
        None => ("", key),
    };

    Some(format!(
        "{}/{}/{}{}",
        endpoint,
        bucket,
        dir,
        urlencoding::encode(name)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_lower_hex(s: &str) -> bool {
        s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    #[test]
    fn test_directory_key() {
        let cases = vec![
            ("folder", "folder/"),
            ("folder/", "folder/"),
            ("a/b", "a/b/"),
            ("", "/"),
        ];

        for (input, expected) in cases {
            assert_eq!(directory_key(input), expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_file_extension() {
        let cases = vec![
            ("photo.jpg", Some(".jpg")),
            ("archive.tar.gz", Some(".gz")),
            (".env", Some(".env")),
            ("trailing.", Some(".")),
            ("noext", None),
        ];

        for (input, expected) in cases {
            assert_eq!(file_extension(input), expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_generate_file_name() {
        let cases = vec![("photo.jpg", ".jpg"), ("report.final.pdf", ".pdf")];

        for (input, extension) in cases {
            let name = generate_file_name(input).unwrap();
            let (id, ext) = name.split_at(32);
            assert_eq!(ext, extension, "failed on extension for case: {}", input);
            assert!(is_lower_hex(id), "failed on id for case: {}", input);
        }

        assert_eq!(generate_file_name("noext"), None);
    }

    #[test]
    fn test_generate_file_name_unique() {
        let first = generate_file_name("a.txt").unwrap();
        let second = generate_file_name("a.txt").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_object_url() {
        let cases = vec![
            (
                "http://localhost:9000",
                "a.txt",
                Some("http://localhost:9000/media/a.txt"),
            ),
            (
                "http://localhost:9000/",
                "/docs/my file.txt",
                Some("http://localhost:9000/media/docs/my%20file.txt"),
            ),
            (
                "https://s3.example.com",
                "folder/sub/",
                Some("https://s3.example.com/media/folder/sub/"),
            ),
            ("http://localhost:9000", "", None),
        ];

        for (endpoint, key, expected) in cases {
            assert_eq!(
                object_url(endpoint, "media", key).as_deref(),
                expected,
                "failed for case: {}",
                key
            );
        }
    }
}
