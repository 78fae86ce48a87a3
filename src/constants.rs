/// 哨兵像素的蓝色通道值。
pub const MARKER_BLUE: u8 = 127;

/// 哨兵像素的绿色通道值。
pub const MARKER_GREEN: u8 = 188;

/// 哨兵像素的红色通道值。
pub const MARKER_RED: u8 = 217;

/// 每个像素固定读取的字节数 (蓝、绿、红、未使用)。
/// 与头部声明的位深无关，这是目标格式的约定。
pub const BYTES_PER_PIXEL: usize = 4;

/// 每个像素中承载消息的通道数 (蓝、绿、红)。
pub const PAYLOAD_CHANNELS: usize = 3;

/// 并行扫描时工作线程数量的上限。
pub const MAX_WORKERS: usize = 8;

/// BMP 文件头与信息头中本程序会读取的字段所占的字节数 (紧凑布局)。
pub const BMP_HEADER_SIZE: usize = 38;

/// 标题行结束后，消息区域相对于长度像素所在行的偏移。
pub const MESSAGE_ROW_OFFSET: i64 = 2;

/// 消息区域的起始列相对于第一个哨兵像素所在列的偏移。
pub const MESSAGE_COL_OFFSET: u32 = 2;
