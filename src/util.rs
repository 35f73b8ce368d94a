pub mod io;

/// Checks whether a byte is a `tchar` (token character).
pub fn is_tchar(b: u8) -> bool {
	b.is_ascii_alphanumeric()
		|| b == b'!'
		|| b == b'#'
		|| b == b'$'
		|| b == b'%'
		|| b == b'&'
		|| b == b'\''
		|| b == b'*'
		|| b == b'+'
		|| b == b'-'
		|| b == b'.'
		|| b == b'^'
		|| b == b'_'
		|| b == b'`'
		|| b == b'|'
		|| b == b'~'
}

/// Checks whether a string is a token.
pub fn is_token(name: &str) -> bool {
	!name.is_empty() && name.bytes().all(is_tchar)
}

/// Checks whether a byte can legally appear in an HTTP header value.
pub fn is_field_vchar(b: u8) -> bool {
	b == b'\t' || b >= 0x20
}

/// Checks whether a string is a valid HTTP header value.
pub fn is_field_value(value: &str) -> bool {
	if value.is_empty() {
		true
	} else {
		let first: u8 = *value.as_bytes().first().unwrap();
		let last: u8 = *value.as_bytes().last().unwrap();
		first != b' '
			&& first != b'\t'
			&& last != b' '
			&& last != b'\t'
			&& value.bytes().all(is_field_vchar)
	}
}

/// Splits an absolute URL into its authority and request-target parts.
///
/// The scheme, if present, is discarded. The authority keeps any explicit port. The
/// request-target always starts with `/`; a URL with no path component yields `/`, and a URL whose
/// query begins immediately after the authority yields `/` followed by the query.
pub fn split_url(url: &str) -> (&str, String) {
	let rest = url.find("://").map_or(url, |n| &url[n + 3..]);
	match rest.find(|c| c == '/' || c == '?') {
		Some(n) if rest.as_bytes()[n] == b'?' => (&rest[..n], format!("/{}", &rest[n..])),
		Some(n) => (&rest[..n], rest[n..].to_string()),
		None => (rest, "/".to_string()),
	}
}
