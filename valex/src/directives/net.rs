//! Network addresses, both as strings and as parsed fields.

use crate::{ConfigError, Directive, Error, ErrorValue, Params, Validator};
use core::cmp::Ordering;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use url::Url;

static HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

fn invalid(msg: String) -> Error {
    ErrorValue::Invalid(msg).into()
}

/// Validates that a string is an IEEE 802 MAC-48, EUI-48, EUI-64 or
/// 20-octet IP over InfiniBand address.
///
/// Octets are separated by `:` or `-`, or grouped by four hex digits
/// separated by `.`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MacAddress;

fn is_mac(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < 14 {
        return false;
    }

    let (sep, group_len) = match (bytes[2], bytes[4]) {
        (b':', _) => (':', 2),
        (b'-', _) => ('-', 2),
        (_, b'.') => ('.', 4),
        _ => return false,
    };

    if (s.len() + 1) % (group_len + 1) != 0 {
        return false;
    }

    let groups = (s.len() + 1) / (group_len + 1);
    let octets = groups * group_len / 2;
    if !matches!(octets, 6 | 8 | 20) {
        return false;
    }

    s.split(sep)
        .all(|g| g.len() == group_len && g.bytes().all(|b| b.is_ascii_hexdigit()))
}

impl Validator<str> for MacAddress {
    fn validate(&self, value: &str) -> Result<(), Error> {
        if !is_mac(value) {
            return Err(invalid(format!("invalid MAC address {:?}", value)));
        }
        Ok(())
    }
}

unit_directive!(MacAddress, "mac", str);

/// Which address family [IpFormat] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    Any,
    /// IPv4, including IPv4-mapped IPv6 addresses.
    V4,
    /// IPv6, excluding IPv4-mapped addresses.
    V6,
}

/// Validates that a string is an IP address of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpFormat {
    name: &'static str,
    family: IpFamily,
}

impl IpFormat {
    /// Registered as `ip`.
    pub fn any() -> Self {
        Self {
            name: "ip",
            family: IpFamily::Any,
        }
    }

    /// Registered as `ipv4`.
    pub fn v4() -> Self {
        Self {
            name: "ipv4",
            family: IpFamily::V4,
        }
    }

    /// Registered as `ipv6`.
    pub fn v6() -> Self {
        Self {
            name: "ipv6",
            family: IpFamily::V6,
        }
    }

    pub fn family(&self) -> IpFamily {
        self.family
    }
}

impl Validator<str> for IpFormat {
    fn validate(&self, value: &str) -> Result<(), Error> {
        let addr = value.parse::<IpAddr>().ok();

        let ok = match (self.family, addr) {
            (_, None) => false,
            (IpFamily::Any, Some(_)) => true,
            (IpFamily::V4, Some(addr)) => Octets::from(addr).is_v4(),
            (IpFamily::V6, Some(addr)) => !Octets::from(addr).is_v4(),
        };

        if ok {
            return Ok(());
        }

        let label = match self.family {
            IpFamily::Any => "IP",
            IpFamily::V4 => "IPv4",
            IpFamily::V6 => "IPv6",
        };
        Err(invalid(format!("invalid {} address {:?}", label, value)))
    }
}

impl Directive for IpFormat {
    type Payload = str;

    fn name(&self) -> &str {
        self.name
    }

    fn materialize(&self, _params: &mut Params<'_>) -> Result<Self, Error> {
        Ok(*self)
    }
}

/// Validates that a string is a host name as in RFC 1123.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hostname;

impl Validator<str> for Hostname {
    fn validate(&self, value: &str) -> Result<(), Error> {
        if value == "localhost" || (!value.is_empty() && HOSTNAME.is_match(value)) {
            return Ok(());
        }
        Err(invalid(format!("value {:?} is not a valid hostname", value)))
    }
}

unit_directive!(Hostname, "hostname", str);

/// Validates that a string is an address with a prefix length, such as `10.0.0.0/8`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cidr;

fn parse_cidr(value: &str) -> Result<(IpAddr, u8), String> {
    let (addr, prefix) = value
        .split_once('/')
        .ok_or_else(|| "missing prefix length".to_string())?;

    let addr = addr.parse::<IpAddr>().map_err(|e| e.to_string())?;

    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid prefix length {:?}", prefix));
    }

    let max = if addr.is_ipv4() { 32 } else { 128 };
    match prefix.parse::<u8>() {
        Ok(p) if p <= max => Ok((addr, p)),
        _ => Err(format!("prefix length {} exceeds {}", prefix, max)),
    }
}

impl Validator<str> for Cidr {
    fn validate(&self, value: &str) -> Result<(), Error> {
        parse_cidr(value)
            .map(|_| ())
            .map_err(|reason| invalid(format!("invalid CIDR {:?}: {}", value, reason)))
    }
}

unit_directive!(Cidr, "cidr", str);

/// Validates that an address is not unspecified (`0.0.0.0` or `::`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonZeroIp;

impl Validator<IpAddr> for NonZeroIp {
    fn validate(&self, value: &IpAddr) -> Result<(), Error> {
        if value.is_unspecified() {
            return Err(ErrorValue::Zero { subject: "ip" }.into());
        }
        Ok(())
    }
}

unit_directive!(NonZeroIp, "!zeroip", IpAddr, zero = "ip");

/// The canonical byte form of an address.
///
/// IPv4-mapped IPv6 addresses are treated as IPv4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Octets {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl Octets {
    fn is_v4(&self) -> bool {
        matches!(self, Octets::V4(_))
    }

    fn family(&self) -> &'static str {
        match self {
            Octets::V4(_) => "IPv4",
            Octets::V6(_) => "IPv6",
        }
    }

    fn as_slice(&self) -> &[u8] {
        match self {
            Octets::V4(b) => b,
            Octets::V6(b) => b,
        }
    }

    /// Unsigned byte-wise comparison, `None` across families.
    fn compare(&self, other: &Octets) -> Option<Ordering> {
        if self.is_v4() != other.is_v4() {
            return None;
        }
        Some(self.as_slice().cmp(other.as_slice()))
    }
}

impl From<IpAddr> for Octets {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(a) => Octets::V4(a.octets()),
            IpAddr::V6(a) => match a.to_ipv4_mapped() {
                Some(v4) => Octets::V4(v4.octets()),
                None => Octets::V6(a.octets()),
            },
        }
    }
}

/// Validates that an address is within an inclusive range.
///
/// Both bounds and the value must be of the same family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IpRange {
    pub start: Option<IpAddr>,
    pub end: Option<IpAddr>,
}

impl IpRange {
    pub fn new(start: IpAddr, end: IpAddr) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    fn bounds(&self) -> Result<(Octets, Octets), Error> {
        let start = Octets::from(self.start.ok_or(ConfigError::MissingParam { param: "start" })?);
        let end = Octets::from(self.end.ok_or(ConfigError::MissingParam { param: "end" })?);

        match start.compare(&end) {
            None => Err(ConfigError::IpFamilyMismatch {
                expected: start.family(),
                found: end.family(),
            }
            .into()),
            Some(Ordering::Greater) => Err(ConfigError::InvalidParam {
                param: "start",
                reason: r#"cannot exceed "end""#.into(),
            }
            .into()),
            Some(_) => Ok((start, end)),
        }
    }
}

impl Validator<IpAddr> for IpRange {
    fn validate(&self, value: &IpAddr) -> Result<(), Error> {
        let (start, end) = self.bounds()?;
        let candidate = Octets::from(*value);

        let (lower, upper) = match (candidate.compare(&start), candidate.compare(&end)) {
            (Some(lower), Some(upper)) => (lower, upper),
            _ => {
                return Err(ConfigError::IpFamilyMismatch {
                    expected: start.family(),
                    found: candidate.family(),
                }
                .into())
            }
        };

        if lower == Ordering::Less || upper == Ordering::Greater {
            return Err(invalid(format!(
                "ip {} is not in range [{}, {}]",
                value,
                self.start.unwrap_or(*value),
                self.end.unwrap_or(*value)
            )));
        }

        Ok(())
    }
}

impl Directive for IpRange {
    type Payload = IpAddr;

    fn name(&self) -> &str {
        "iprange"
    }

    fn materialize(&self, params: &mut Params<'_>) -> Result<Self, Error> {
        let configured = Self {
            start: Some(params.required("start")?),
            end: Some(params.required("end")?),
        };
        configured.bounds()?;
        Ok(configured)
    }
}

/// Validates that a URL has a host or a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonZeroUrl;

impl Validator<Url> for NonZeroUrl {
    fn validate(&self, value: &Url) -> Result<(), Error> {
        if crate::predicate::is_zero_value(value) {
            return Err(ErrorValue::Zero { subject: "url" }.into());
        }
        Ok(())
    }
}

unit_directive!(NonZeroUrl, "!zerourl", Url, zero = "url");
