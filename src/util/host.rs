use std::io;

/// Name of the machine the benchmark runs on
#[cfg(unix)]
pub fn hostname() -> io::Result<String> {
    let mut buf = [0u8; 256];
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// Name of the machine the benchmark runs on
#[cfg(not(unix))]
pub fn hostname() -> io::Result<String> {
    std::env::var("COMPUTERNAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "hostname is not available"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_is_not_empty() {
        let name = hostname().unwrap();
        assert!(!name.is_empty());
        assert!(!name.contains('\0'));
    }
}
