//! Interface discovery
//!
//! Enumerates the host's IPv4 interface addresses. Used to list candidate
//! uplinks and to find the device that owns an uplink address.

use std::io;
use std::net::Ipv4Addr;

/// An IPv4 address assigned to a network interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddr {
    /// Interface name, e.g. `eth0`
    pub name: String,
    /// Assigned address
    pub addr: Ipv4Addr,
}

/// List IPv4 addresses on interfaces that are up and not loopback
#[cfg(unix)]
pub fn list_ipv4_interfaces() -> io::Result<Vec<InterfaceAddr>> {
    use std::ffi::CStr;

    let mut ifap: *mut libc::ifaddrs = std::ptr::null_mut();
    // SAFETY: getifaddrs fills `ifap` with a list we release below.
    if unsafe { libc::getifaddrs(&mut ifap) } != 0 {
        return Err(io::Error::last_os_error());
    }

    let mut result = Vec::new();
    let mut cursor = ifap;
    while !cursor.is_null() {
        // SAFETY: `cursor` is a node of the list returned by getifaddrs.
        let ifa = unsafe { &*cursor };
        cursor = ifa.ifa_next;

        let flags = ifa.ifa_flags as libc::c_int;
        if flags & libc::IFF_UP == 0 || flags & libc::IFF_LOOPBACK != 0 {
            continue;
        }
        if ifa.ifa_addr.is_null() || ifa.ifa_name.is_null() {
            continue;
        }

        // SAFETY: ifa_addr is non-null and the family is checked before the cast.
        let family = unsafe { (*ifa.ifa_addr).sa_family } as libc::c_int;
        if family != libc::AF_INET {
            continue;
        }
        let sin = unsafe { &*(ifa.ifa_addr as *const libc::sockaddr_in) };
        let addr = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));

        // SAFETY: ifa_name is a NUL-terminated string owned by the list.
        let name = unsafe { CStr::from_ptr(ifa.ifa_name) }
            .to_string_lossy()
            .into_owned();

        result.push(InterfaceAddr { name, addr });
    }

    // SAFETY: `ifap` came from a successful getifaddrs call.
    unsafe { libc::freeifaddrs(ifap) };

    Ok(result)
}

/// List IPv4 addresses on interfaces that are up and not loopback
#[cfg(not(unix))]
pub fn list_ipv4_interfaces() -> io::Result<Vec<InterfaceAddr>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "interface enumeration is not supported on this platform",
    ))
}

/// Name of the interface that carries `ip`, if any
pub fn interface_for_ip(ip: Ipv4Addr) -> io::Result<Option<String>> {
    Ok(find_interface(&list_ipv4_interfaces()?, ip))
}

fn find_interface(interfaces: &[InterfaceAddr], ip: Ipv4Addr) -> Option<String> {
    interfaces
        .iter()
        .find(|iface| iface.addr == ip)
        .map(|iface| iface.name.clone())
}
