use std::{any::Any, error::Error as StdError};

struct It<'a> {
    curr_source: Option<&'a dyn StdError>,
}

impl<'a> Iterator for It<'a> {
    type Item = &'a dyn StdError;

    fn next(&mut self) -> Option<Self::Item> {
        let err = self.curr_source?;
        self.curr_source = err.source();
        Some(err)
    }
}

/// Iterates over `err` followed by its chain of sources.
pub fn error_chain(err: &dyn StdError) -> impl Iterator<Item = &dyn StdError> {
    It {
        curr_source: Some(err),
    }
}

/// Message of `err` with the messages of its sources nested as `, source_msg=[...]`.
pub fn error_recursive_msg(err: &dyn StdError) -> String {
    let mut buf = String::new();
    let mut closing_buf = String::new();

    for (i, item) in error_chain(err).enumerate() {
        if i > 0 {
            buf.push_str(", source_msg=[");
            closing_buf.push(']');
        }
        buf.push_str(&item.to_string());
    }

    buf.push_str(&closing_buf);
    buf
}

/// Best-effort text of a panic payload captured by `catch_unwind`.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
