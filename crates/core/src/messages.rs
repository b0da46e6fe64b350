//! Message catalog
//!
//! User-facing strings are addressed by numeric code and formatted with
//! positional `{0}`, `{1}`, ... placeholders.

/// Field is required
pub const MSG_REQUIRED: u32 = 100;
/// Delete dialog title
pub const MSG_DELETE_TITLE: u32 = 101;
/// Entity cannot be deleted while referenced
pub const MSG_DELETE_IN_USE: u32 = 102;
/// Delete confirmation prompt
pub const MSG_DELETE_CONFIRM: u32 = 103;
/// Error dialog title
pub const MSG_ERROR_TITLE: u32 = 104;
/// String shorter than allowed
pub const MSG_MIN_LENGTH: u32 = 105;
/// String longer than allowed
pub const MSG_MAX_LENGTH: u32 = 106;
/// Number outside the allowed range
pub const MSG_RANGE: u32 = 107;
/// Saving indicator
pub const MSG_SAVING: u32 = 108;
/// Value is not a number
pub const MSG_NOT_A_NUMBER: u32 = 109;
/// Regex mismatch without a custom message
pub const MSG_PATTERN: u32 = 110;
/// Invalid email
pub const MSG_EMAIL: u32 = 111;
/// Invalid IPv4 address
pub const MSG_IPV4: u32 = 112;
/// Invalid URL
pub const MSG_URL: u32 = 113;
/// Invalid date
pub const MSG_DATE: u32 = 114;
/// Dialog titles
pub const MSG_ADD_TITLE: u32 = 115;
pub const MSG_EDIT_TITLE: u32 = 116;
pub const MSG_CLONE_TITLE: u32 = 117;
/// Unknown failure with no payload
pub const MSG_UNKNOWN_FAILURE: u32 = 118;
/// Deleting indicator
pub const MSG_DELETING: u32 = 119;

fn template(code: u32) -> Option<&'static str> {
    let text = match code {
        MSG_REQUIRED => "Field {0} is required",
        MSG_DELETE_TITLE => "Delete Confirmation",
        MSG_DELETE_IN_USE => "{0} cannot be deleted because it is in use",
        MSG_DELETE_CONFIRM => "Are you sure you want to delete \"{0}\" {1}?",
        MSG_ERROR_TITLE => "Error Message",
        MSG_MIN_LENGTH => "Length of {0} should be greater than or equal to {1}",
        MSG_MAX_LENGTH => "Length of {0} should be less than or equal to {1}",
        MSG_RANGE => "Field {0} should be within the range of [{1} and {2}]",
        MSG_SAVING => "Saving",
        MSG_NOT_A_NUMBER => "Field {0} is not a number",
        MSG_PATTERN => "Field {0} does not match the expected format",
        MSG_EMAIL => "Field {0} is not a valid email address",
        MSG_IPV4 => "Field {0} is not a valid IPV4 address",
        MSG_URL => "Field {0} is not a valid URL",
        MSG_DATE => "Field {0} is not a valid date in ISO 8601 format",
        MSG_ADD_TITLE => "Add {0}",
        MSG_EDIT_TITLE => "Edit {0}",
        MSG_CLONE_TITLE => "Clone {0}",
        MSG_UNKNOWN_FAILURE => "An unknown error occurred",
        MSG_DELETING => "Deleting",
        _ => return None,
    };
    Some(text)
}

/// Format message `code` with positional arguments
///
/// Unknown codes render as `Message {code}`; missing arguments leave their
/// placeholder untouched.
pub fn formatted_message(code: u32, args: &[&str]) -> String {
    let Some(text) = template(code) else {
        return format!("Message {}", code);
    };

    let mut out = text.to_string();
    for (i, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{}}}", i), arg);
    }
    out
}
