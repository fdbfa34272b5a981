//! 内存抽象层
//!
//! 本模块定义了内存访问的统一接口 `Memory` trait，
//! 以及 CPU 独占持有的线性内存实现 `FlatMemory`。
//!
//! 访问不要求对齐；越界访问不会 panic，也不会触碰相邻字节：
//! 底层 `load*`/`store*` 返回 `MemError`，执行单元使用的
//! `read`/`write` 记录一条 warn 日志后分别返回 0 / 丢弃写入。

use tracing::{debug, warn};

/// 默认内存容量：1 MiB
pub const DEFAULT_MEMORY_SIZE: usize = 1024 * 1024;

/// 访存粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSize {
    Byte,
    Half,
    Word,
}

impl AccessSize {
    pub fn bytes(self) -> usize {
        match self {
            AccessSize::Byte => 1,
            AccessSize::Half => 2,
            AccessSize::Word => 4,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }
}

/// 内存访问错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MemError {
    /// 访问区间 [addr, addr+size) 未完全落在内存区域内
    #[error("out-of-range {access:?} access at 0x{addr:08x} (region base=0x{base:08x}, size=0x{size:x})")]
    OutOfRange {
        addr: u32,
        access: AccessSize,
        base: u32,
        size: usize,
    },
}

pub type MemResult<T> = Result<T, MemError>;

/// 按 `size` 的最高位做符号扩展
///
/// `value` 只有低 `size.bits()` 位有效；若其中最高位为 1，
/// 高位全部补 1。
#[inline]
pub fn sign_extend(value: u32, size: AccessSize) -> u32 {
    let bits = size.bits();
    if bits >= 32 {
        return value;
    }
    if (value >> (bits - 1)) & 1 == 1 {
        value | (u32::MAX << bits)
    } else {
        value
    }
}

/// 内存访问的统一接口
///
/// `load*`/`store*` 是可失败的原语；`read`/`write` 在其之上提供
/// 执行单元需要的“总是成功”的语义。
pub trait Memory {
    /// 从指定地址读取 8 位数据
    fn load8(&self, addr: u32) -> MemResult<u8>;

    /// 从指定地址读取 16 位数据（小端序）
    fn load16(&self, addr: u32) -> MemResult<u16>;

    /// 从指定地址读取 32 位数据（小端序）
    fn load32(&self, addr: u32) -> MemResult<u32>;

    /// 向指定地址写入 8 位数据
    fn store8(&mut self, addr: u32, value: u8) -> MemResult<()>;

    /// 向指定地址写入 16 位数据（小端序）
    fn store16(&mut self, addr: u32, value: u16) -> MemResult<()>;

    /// 向指定地址写入 32 位数据（小端序）
    fn store32(&mut self, addr: u32, value: u32) -> MemResult<()>;

    /// 读取 1/2/4 字节，可选符号扩展；越界时记录日志并返回 0
    fn read(&self, addr: u32, size: AccessSize, signed: bool) -> u32 {
        let loaded = match size {
            AccessSize::Byte => self.load8(addr).map(u32::from),
            AccessSize::Half => self.load16(addr).map(u32::from),
            AccessSize::Word => self.load32(addr),
        };
        match loaded {
            Ok(value) if signed => sign_extend(value, size),
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "memory read ignored, returning 0");
                0
            }
        }
    }

    /// 写入 `value` 的低 1/2/4 字节；越界时记录日志并丢弃
    fn write(&mut self, addr: u32, value: u32, size: AccessSize) {
        let stored = match size {
            AccessSize::Byte => self.store8(addr, value as u8),
            AccessSize::Half => self.store16(addr, value as u16),
            AccessSize::Word => self.store32(addr, value),
        };
        if let Err(err) = stored {
            warn!(%err, "memory write discarded");
        }
    }
}

/// 简单线性内存实现
///
/// 使用 `Vec<u8>` 存储整个工作集，创建时清零。
/// 支持可选的基地址偏移，用于把程序映射到非零地址（例如 ELF 的 0x8000_0000）。
#[derive(Clone)]
pub struct FlatMemory {
    /// 内存数据存储
    data: Vec<u8>,
    /// 内存映射起始地址
    base_addr: u32,
}

impl FlatMemory {
    /// 创建一个指定大小的内存区域
    ///
    /// # 示例
    ///
    /// ```
    /// use rv32i_sim::memory::FlatMemory;
    ///
    /// // 创建 64KB 的内存，起始地址为 0
    /// let mem = FlatMemory::new(64 * 1024, 0);
    /// assert_eq!(mem.size(), 64 * 1024);
    /// ```
    pub fn new(size: usize, base_addr: u32) -> Self {
        FlatMemory {
            data: vec![0; size],
            base_addr,
        }
    }

    /// 获取内存的基地址
    pub fn base_addr(&self) -> u32 {
        self.base_addr
    }

    /// 获取内存的大小
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 全部清零
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    fn bounds_check(&self, addr: u32, access: AccessSize, len: usize) -> MemResult<usize> {
        let out_of_range = MemError::OutOfRange {
            addr,
            access,
            base: self.base_addr,
            size: self.data.len(),
        };
        let relative = addr.checked_sub(self.base_addr).ok_or(out_of_range)? as usize;
        let end = relative.checked_add(len).ok_or(out_of_range)?;
        if end > self.data.len() {
            return Err(out_of_range);
        }
        Ok(relative)
    }

    /// 批量拷贝程序字节，超出内存末尾的部分直接丢弃
    ///
    /// 返回实际写入的字节数。与 `write_bytes` 不同，这里从不失败。
    pub fn load_bytes(&mut self, addr: u32, bytes: &[u8]) -> usize {
        let Some(start) = addr.checked_sub(self.base_addr).map(|r| r as usize) else {
            debug!("load at 0x{addr:08x} below memory base dropped");
            return 0;
        };
        if start >= self.data.len() {
            debug!("load at 0x{addr:08x} past end of memory dropped");
            return 0;
        }
        let copied = bytes.len().min(self.data.len() - start);
        self.data[start..start + copied].copy_from_slice(&bytes[..copied]);
        if copied < bytes.len() {
            debug!(dropped = bytes.len() - copied, "load truncated at end of memory");
        }
        copied
    }

    /// 批量写入数据到内存，整个区间必须在内存内
    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> MemResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        let start = self.bounds_check(addr, AccessSize::Byte, data.len())?;
        self.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// 批量读取数据，返回副本
    pub fn read_bytes(&self, addr: u32, len: usize) -> MemResult<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let start = self.bounds_check(addr, AccessSize::Byte, len)?;
        Ok(self.data[start..start + len].to_vec())
    }

    /// 将指定范围填充为固定字节
    pub fn fill(&mut self, addr: u32, len: usize, value: u8) -> MemResult<()> {
        if len == 0 {
            return Ok(());
        }
        let start = self.bounds_check(addr, AccessSize::Byte, len)?;
        self.data[start..start + len].fill(value);
        Ok(())
    }
}

impl Default for FlatMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_SIZE, 0)
    }
}

impl std::fmt::Debug for FlatMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatMemory")
            .field("base_addr", &format_args!("0x{:08x}", self.base_addr))
            .field("size", &self.data.len())
            .finish()
    }
}

impl Memory for FlatMemory {
    fn load8(&self, addr: u32) -> MemResult<u8> {
        let idx = self.bounds_check(addr, AccessSize::Byte, 1)?;
        Ok(self.data[idx])
    }

    fn load16(&self, addr: u32) -> MemResult<u16> {
        let idx = self.bounds_check(addr, AccessSize::Half, 2)?;
        Ok(u16::from_le_bytes([self.data[idx], self.data[idx + 1]]))
    }

    fn load32(&self, addr: u32) -> MemResult<u32> {
        let idx = self.bounds_check(addr, AccessSize::Word, 4)?;
        Ok(u32::from_le_bytes([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]))
    }

    fn store8(&mut self, addr: u32, value: u8) -> MemResult<()> {
        let idx = self.bounds_check(addr, AccessSize::Byte, 1)?;
        self.data[idx] = value;
        Ok(())
    }

    fn store16(&mut self, addr: u32, value: u16) -> MemResult<()> {
        let idx = self.bounds_check(addr, AccessSize::Half, 2)?;
        self.data[idx..idx + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn store32(&mut self, addr: u32, value: u32) -> MemResult<()> {
        let idx = self.bounds_check(addr, AccessSize::Word, 4)?;
        self.data[idx..idx + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}
