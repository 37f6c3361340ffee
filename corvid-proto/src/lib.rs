pub mod buffer;
mod clock;
mod codec;
mod header;
mod name;
mod question;
mod rcode;
mod record;
mod record_type;

pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{decode_query, decode_response, encode_query, encode_response, CodecError, DnsResponse};
pub use header::Header;
pub use name::{Name, NameError};
pub use question::{Question, QuestionReadError};
pub use rcode::Rcode;
pub use record::{RecordReadError, ResourceRecord};
pub use record_type::{RecordClass, RecordType};
