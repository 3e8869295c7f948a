//! RADIUS wire constants (RFC 2865, 2866, 2869, 3162, 3576).

pub const HEADER_LEN: usize = 20;
pub const MAX_LENGTH: usize = 4096;
pub const AUTHENTICATOR_LEN: usize = 16;

pub const AUTH_PORT: u16 = 1812;
pub const ACCT_PORT: u16 = 1813;
pub const DYNAUTH_PORT: u16 = 3799;
pub const LEGACY_AUTH_PORT: u16 = 1645;
pub const LEGACY_ACCT_PORT: u16 = 1646;

pub const CODE_ACCESS_REQUEST: u8 = 1;
pub const CODE_ACCESS_ACCEPT: u8 = 2;
pub const CODE_ACCESS_REJECT: u8 = 3;
pub const CODE_ACCOUNTING_REQUEST: u8 = 4;
pub const CODE_ACCOUNTING_RESPONSE: u8 = 5;
pub const CODE_ACCESS_CHALLENGE: u8 = 11;
pub const CODE_STATUS_SERVER: u8 = 12;
pub const CODE_STATUS_CLIENT: u8 = 13;
pub const CODE_DISCONNECT_REQUEST: u8 = 40;
pub const CODE_DISCONNECT_ACK: u8 = 41;
pub const CODE_DISCONNECT_NAK: u8 = 42;
pub const CODE_COA_REQUEST: u8 = 43;
pub const CODE_COA_ACK: u8 = 44;
pub const CODE_COA_NAK: u8 = 45;

pub const ATTR_USER_NAME: u32 = 1;
pub const ATTR_USER_PASSWORD: u32 = 2;
pub const ATTR_CHAP_PASSWORD: u32 = 3;
pub const ATTR_NAS_IP_ADDRESS: u32 = 4;
pub const ATTR_NAS_PORT: u32 = 5;
pub const ATTR_SERVICE_TYPE: u32 = 6;
pub const ATTR_FRAMED_PROTOCOL: u32 = 7;
pub const ATTR_FRAMED_IP_ADDRESS: u32 = 8;
pub const ATTR_FRAMED_IP_NETMASK: u32 = 9;
pub const ATTR_FILTER_ID: u32 = 11;
pub const ATTR_FRAMED_MTU: u32 = 12;
pub const ATTR_REPLY_MESSAGE: u32 = 18;
pub const ATTR_STATE: u32 = 24;
pub const ATTR_CLASS: u32 = 25;
pub const ATTR_VENDOR_SPECIFIC: u32 = 26;
pub const ATTR_SESSION_TIMEOUT: u32 = 27;
pub const ATTR_IDLE_TIMEOUT: u32 = 28;
pub const ATTR_CALLED_STATION_ID: u32 = 30;
pub const ATTR_CALLING_STATION_ID: u32 = 31;
pub const ATTR_NAS_IDENTIFIER: u32 = 32;
pub const ATTR_PROXY_STATE: u32 = 33;
pub const ATTR_ACCT_STATUS_TYPE: u32 = 40;
pub const ATTR_ACCT_DELAY_TIME: u32 = 41;
pub const ATTR_ACCT_INPUT_OCTETS: u32 = 42;
pub const ATTR_ACCT_OUTPUT_OCTETS: u32 = 43;
pub const ATTR_ACCT_SESSION_ID: u32 = 44;
pub const ATTR_ACCT_AUTHENTIC: u32 = 45;
pub const ATTR_ACCT_SESSION_TIME: u32 = 46;
pub const ATTR_ACCT_INPUT_PACKETS: u32 = 47;
pub const ATTR_ACCT_OUTPUT_PACKETS: u32 = 48;
pub const ATTR_ACCT_TERMINATE_CAUSE: u32 = 49;
pub const ATTR_EVENT_TIMESTAMP: u32 = 55;
pub const ATTR_CHAP_CHALLENGE: u32 = 60;
pub const ATTR_NAS_PORT_TYPE: u32 = 61;
pub const ATTR_EAP_MESSAGE: u32 = 79;
pub const ATTR_MESSAGE_AUTHENTICATOR: u32 = 80;
pub const ATTR_NAS_PORT_ID: u32 = 87;
pub const ATTR_NAS_IPV6_ADDRESS: u32 = 95;
pub const ATTR_FRAMED_IPV6_PREFIX: u32 = 97;
pub const ATTR_ERROR_CAUSE: u32 = 101;

pub const VENDOR_CISCO: u32 = 9;
pub const VENDOR_MICROSOFT: u32 = 311;

pub const MESSAGE_AUTHENTICATOR_LEN: usize = 16;
pub const CHAP_PASSWORD_LEN: usize = 17;
pub const EAP_HEADER_LEN: usize = 4;
pub const MAX_IPV6_PREFIX: u8 = 128;
