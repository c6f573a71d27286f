//! Unpacker for the well-known self-decoding `eval(function(p,a,c,k,e,d)...)`
//! script wrapper. The wrapper carries the original source with every word
//! replaced by a base-`a` token and a `|`-joined dictionary of the original
//! words; reconstitution is plain per-token dictionary substitution, so no JS
//! engine is needed.

use std::sync::LazyLock;

use regex::Regex;

static PACKED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"eval\(function\(p,a,c,k,e,(?:r|d)\)\{.+?\}\('((?:[^'\\]|\\.)*)',\s*(\d+),\s*(\d+),\s*'((?:[^'\\]|\\.)*)'\.split\('\|'\)",
    )
    .unwrap()
});

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Whether the source contains a packed-script wrapper.
pub fn is_packed(source: &str) -> bool {
    PACKED_REGEX.is_match(source)
}

/// Reconstitute the original source of the first packed script found.
pub fn unpack(source: &str) -> Option<String> {
    let captures = PACKED_REGEX.captures(source)?;

    let payload = unescape(captures.get(1)?.as_str());
    let radix: u64 = captures.get(2)?.as_str().parse().ok()?;
    let count: usize = captures.get(3)?.as_str().parse().ok()?;
    let dictionary: Vec<&str> = captures.get(4)?.as_str().split('|').collect();

    if radix == 0 || dictionary.is_empty() {
        return None;
    }

    let unpacked = TOKEN_REGEX.replace_all(&payload, |token: &regex::Captures<'_>| {
        let token = token.get(0).unwrap().as_str();
        match parse_radix(token, radix) {
            Some(index) if (index as usize) < count => {
                let word = dictionary.get(index as usize).copied().unwrap_or("");
                if word.is_empty() {
                    token.to_string()
                } else {
                    word.to_string()
                }
            }
            _ => token.to_string(),
        }
    });

    Some(unpacked.into_owned())
}

fn unescape(payload: &str) -> String {
    payload.replace("\\'", "'").replace("\\\\", "\\")
}

/// Parse a packer token. Radix ≤ 36 follows the usual 0-9a-z digits; the
/// packer's base 62 appends A-Z on top.
fn parse_radix(token: &str, radix: u64) -> Option<u64> {
    if token.is_empty() {
        return None;
    }
    let mut value: u64 = 0;
    for c in token.chars() {
        let digit = match c {
            '0'..='9' => c as u64 - '0' as u64,
            'a'..='z' => c as u64 - 'a' as u64 + 10,
            'A'..='Z' => c as u64 - 'A' as u64 + 36,
            _ => return None,
        };
        if digit >= radix {
            return None;
        }
        value = value.checked_mul(radix)?.checked_add(digit)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    // A minimal packed sample in the canonical wrapper shape. Token `0`
    // becomes `player`, `1` -> `setup`, `2` -> `file`, `3` -> the URL.
    const PACKED_SAMPLE: &str = concat!(
        "eval(function(p,a,c,k,e,d){e=function(c){return c};if(!''.replace(/^/,String)){",
        "while(c--){d[c]=k[c]||c}k=[function(e){return d[e]}];e=function(){return'\\\\w+'};c=1};",
        "while(c--){if(k[c]){p=p.replace(new RegExp('\\\\b'+e(c)+'\\\\b','g'),k[c])}}return p}",
        "('var 0=1({2:\"3\"});',10,4,",
        "'player|setup|file|https://cdn-e7.mxcontent.net/hls/tq2w8xkb/master.m3u8'.split('|'),0,{}))"
    );

    #[test]
    fn test_detects_packed_wrapper() {
        assert!(is_packed(PACKED_SAMPLE));
        assert!(!is_packed("var player = setup({file: 'x'});"));
    }

    #[test]
    fn test_unpack_recovers_master_playlist_url() {
        let unpacked = unpack(PACKED_SAMPLE).unwrap();
        assert_eq!(
            unpacked,
            "var player=setup({file:\"https://cdn-e7.mxcontent.net/hls/tq2w8xkb/master.m3u8\"});"
        );
        assert!(unpacked.contains("https://cdn-e7.mxcontent.net/hls/tq2w8xkb/master.m3u8"));
    }

    #[test]
    fn test_tokens_without_dictionary_entry_pass_through() {
        let source = concat!(
            "eval(function(p,a,c,k,e,d){return p}",
            "('1 zz 0;',10,2,'alpha|beta'.split('|'),0,{}))"
        );
        assert_eq!(unpack(source).unwrap(), "beta zz alpha;");
    }

    #[test]
    fn test_parse_radix_base62() {
        assert_eq!(parse_radix("a", 62), Some(10));
        assert_eq!(parse_radix("A", 62), Some(36));
        assert_eq!(parse_radix("10", 62), Some(62));
        assert_eq!(parse_radix("A", 36), None);
    }
}
