//! Pure extractors over SuperHub HTML
//!
//! Both pages come out of firmware templates rather than anything
//! well-formed, so extraction works on the raw text the way the admin pages
//! are actually laid out. Everything here is side-effect free and tested
//! against static fixtures.

use std::sync::OnceLock;

use regex::Regex;

use hubsync_core::traits::WanIp;
use hubsync_core::{Error, Result};

fn password_input_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<input[^>]*\bid\s*=\s*['"]password['"][^>]*>"#)
            .expect("hard-coded pattern")
    })
}

fn name_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)\bname\s*=\s*['"]([^'"]+)['"]"#).expect("hard-coded pattern")
    })
}

fn wan_ip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)\bid\s*=\s*['"]superHubVersion['"].*?<div[^>]*>.*?<span[^>]*>(.*?)</span>"#)
            .expect("hard-coded pattern")
    })
}

/// Discover the `name` attribute of the login form's password input.
///
/// The input is identified by `id="password"`; the name the form submits
/// under is firmware-generated and has to be read off the same tag on every
/// login.
pub fn password_field_name(html: &str) -> Result<String> {
    let tag = password_input_re()
        .find(html)
        .ok_or_else(|| Error::parse("login page has no password input"))?;

    name_attr_re()
        .captures(tag.as_str())
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| Error::parse("password input has no name attribute"))
}

/// Extract the WAN IP text from the device connection status page.
///
/// The value sits in a fixed spot: the span nested one div below the element
/// carrying the `superHubVersion` id.
pub fn wan_ip(html: &str) -> Result<WanIp> {
    let caps = wan_ip_re()
        .captures(html)
        .ok_or_else(|| Error::parse("status page has no WAN IP element"))?;

    let text = caps[1].trim();
    if text.is_empty() {
        return Err(Error::parse("WAN IP element is empty"));
    }

    Ok(WanIp::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Virgin Media Hub</title></head>
<body>
  <form method="post" action="../cgi-bin/VmLoginCgi">
    <label for="password">Settings password</label>
    <input type="password" id="password" name="VmLoginPassword2k5" maxlength="32">
    <input type="submit" value="Sign in">
  </form>
</body>
</html>"#;

    const LOGIN_PAGE_NAME_FIRST: &str =
        r#"<form><input name="pw_field_9" type="password" id="password"></form>"#;

    const LOGIN_PAGE_NO_FIELD: &str = r#"<!DOCTYPE html>
<html>
<body>
  <form method="post" action="../cgi-bin/VmLoginCgi">
    <input type="text" id="username" name="VmLoginUsername">
  </form>
</body>
</html>"#;

    const STATUS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
  <div id="pageContent">
    <h2>Device Connection Status</h2>
    <div id="superHubVersion" class="statusBox">
      <div class="statusRow">
        <span>
          203.0.113.7
        </span>
      </div>
    </div>
  </div>
</body>
</html>"#;

    #[test]
    fn discovers_the_generated_field_name() {
        assert_eq!(
            password_field_name(LOGIN_PAGE).unwrap(),
            "VmLoginPassword2k5"
        );
    }

    #[test]
    fn attribute_order_does_not_matter() {
        assert_eq!(
            password_field_name(LOGIN_PAGE_NAME_FIRST).unwrap(),
            "pw_field_9"
        );
    }

    #[test]
    fn missing_password_input_is_a_parse_error() {
        let err = password_field_name(LOGIN_PAGE_NO_FIELD).unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "got {err:?}");
    }

    #[test]
    fn password_input_without_name_is_a_parse_error() {
        let html = r#"<input type="password" id="password">"#;
        let err = password_field_name(html).unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "got {err:?}");
    }

    #[test]
    fn extracts_the_wan_ip_from_the_fixture() {
        assert_eq!(wan_ip(STATUS_PAGE).unwrap(), WanIp::new("203.0.113.7"));
        assert_eq!(wan_ip(STATUS_PAGE).unwrap().as_str(), "203.0.113.7");
    }

    #[test]
    fn missing_wan_ip_element_is_a_parse_error() {
        let html = "<html><body><div id=\"pageContent\"></div></body></html>";
        let err = wan_ip(html).unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "got {err:?}");
    }

    #[test]
    fn empty_wan_ip_element_is_a_parse_error() {
        let html = r#"<div id="superHubVersion"><div><span>  </span></div></div>"#;
        let err = wan_ip(html).unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "got {err:?}");
    }
}
