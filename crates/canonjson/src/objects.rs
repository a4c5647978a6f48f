//! Object member ordering and emission.

use crate::errors::Error;

/// An encoded object member: key bytes (surrounding quotes included) and
/// value bytes.
pub(crate) struct Member {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Emits `{...}` with members in ascending byte-lexicographic order of
/// their encoded keys. Identical keys fail fast.
pub(crate) fn append_object(buf: &mut Vec<u8>, mut members: Vec<Member>) -> Result<(), Error> {
    members.sort_by(|a, b| a.key.cmp(&b.key));
    buf.push(b'{');
    for (index, member) in members.iter().enumerate() {
        if index > 0 {
            if member.key == members[index - 1].key {
                return Err(Error::UnsupportedValue(format!(
                    "duplicate object key {}",
                    String::from_utf8_lossy(&member.key)
                )));
            }
            buf.push(b',');
        }
        buf.extend_from_slice(&member.key);
        buf.push(b':');
        buf.extend_from_slice(&member.value);
    }
    buf.push(b'}');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(key: &str, value: &str) -> Member {
        Member {
            key: key.as_bytes().to_vec(),
            value: value.as_bytes().to_vec(),
        }
    }

    #[test]
    fn members_sort_bytewise() {
        let mut buf = Vec::new();
        let members = vec![
            member("\"b\"", "2"),
            member("\"a\"", "1"),
            member("\"ab\"", "3"),
        ];
        append_object(&mut buf, members).unwrap();
        assert_eq!(buf, br#"{"a":1,"ab":3,"b":2}"#);
    }

    #[test]
    fn empty_object() {
        let mut buf = Vec::new();
        append_object(&mut buf, Vec::new()).unwrap();
        assert_eq!(buf, b"{}");
    }

    #[test]
    fn duplicate_keys_fail_fast() {
        let mut buf = Vec::new();
        let members = vec![member("\"a\"", "1"), member("\"a\"", "2")];
        assert!(matches!(
            append_object(&mut buf, members),
            Err(Error::UnsupportedValue(_))
        ));
    }
}
