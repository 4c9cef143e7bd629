//! Default log message templates
//!
//! Every category/type combination is pre-seeded with a human-readable
//! message for success, failure and exception outcomes. Templates carry
//! positional `{0}` placeholders filled from caller-supplied arguments;
//! an argument that is missing simply leaves its placeholder in place, so
//! a bad template degrades to readable (if unpolished) text instead of an
//! error.

use crate::entry::{LogCategory, LogType};

/// Success/failure/exception template triple for one category/type pair
#[derive(Debug, Clone, Copy)]
pub struct MessageSet {
    pub success: &'static str,
    pub failure: &'static str,
    pub exception: &'static str,
}

/// Default templates for a category/type combination
pub fn defaults(category: LogCategory, kind: LogType) -> MessageSet {
    use LogCategory::*;
    use LogType::*;

    match (category, kind) {
        (Source, Consumed) => MessageSet {
            success: "Message was consumed",
            failure: "Ran into a failure when consuming message: {0}",
            exception: "Unexpected failure when consuming message: {0}",
        },
        (Source, Mapped) => MessageSet {
            success: "Incoming signal was mapped",
            failure: "Ran into a failure when mapping incoming signal: {0}",
            exception: "Unexpected failure when mapping incoming signal: {0}",
        },
        (Source, Dropped) => MessageSet {
            success: "Incoming message was dropped",
            failure: "Ran into a failure when dropping incoming message: {0}",
            exception: "Unexpected failure when dropping incoming message: {0}",
        },
        (Source, Enforced) => MessageSet {
            success: "Incoming signal passed enforcement",
            failure: "Ran into a failure when enforcing incoming signal: {0}",
            exception: "Unexpected failure when enforcing incoming signal: {0}",
        },
        (Source, Acknowledged) => MessageSet {
            success: "Message was acknowledged",
            failure: "Ran into a failure when acknowledging message: {0}",
            exception: "Unexpected failure when acknowledging message: {0}",
        },
        (Target, Mapped) => MessageSet {
            success: "Outgoing signal was mapped",
            failure: "Ran into a failure when mapping outgoing signal: {0}",
            exception: "Unexpected failure when mapping outgoing signal: {0}",
        },
        (Target, Dropped) => MessageSet {
            success: "Outgoing signal was dropped",
            failure: "Ran into a failure when dropping outgoing signal: {0}",
            exception: "Unexpected failure when dropping outgoing signal: {0}",
        },
        (Target, Filtered) => MessageSet {
            success: "Signal was filtered",
            failure: "Ran into a failure when filtering signal: {0}",
            exception: "Unexpected failure when filtering signal: {0}",
        },
        (Target, Published) => MessageSet {
            success: "Message was published",
            failure: "Ran into a failure when publishing message: {0}",
            exception: "Unexpected failure when publishing message: {0}",
        },
        (Target, Acknowledged) => MessageSet {
            success: "Publish was acknowledged",
            failure: "Ran into a failure when waiting for acknowledgement: {0}",
            exception: "Unexpected failure when waiting for acknowledgement: {0}",
        },
        (Response, Dispatched) => MessageSet {
            success: "Response was dispatched",
            failure: "Ran into a failure when dispatching response: {0}",
            exception: "Unexpected failure when dispatching response: {0}",
        },
        (Response, Dropped) => MessageSet {
            success: "Response was dropped",
            failure: "Ran into a failure when dropping response: {0}",
            exception: "Unexpected failure when dropping response: {0}",
        },
        (Connection, _) | (_, Other) => MessageSet {
            success: "Operation was successful",
            failure: "Operation failed: {0}",
            exception: "Unexpected failure during operation: {0}",
        },
        _ => MessageSet {
            success: "Signal was processed",
            failure: "Ran into a failure when processing signal: {0}",
            exception: "Unexpected failure when processing signal: {0}",
        },
    }
}

/// Fill positional `{n}` placeholders with the given arguments
///
/// Placeholders without a matching argument are left untouched.
pub fn format(template: &str, args: &[&str]) -> String {
    let mut message = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        message = message.replace(&format!("{{{}}}", i), arg);
    }
    message
}
