//! The default size-class table.

/// One bucket of the router: blocks of `block_size` bytes, allocated from the
/// system `blocks_per_page` at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeClass {
    pub block_size: usize,
    pub blocks_per_page: usize,
}

impl SizeClass {
    pub const fn new(block_size: usize, blocks_per_page: usize) -> Self {
        SizeClass {
            block_size,
            blocks_per_page,
        }
    }
}

const fn class(block_size: usize, blocks_per_page: usize) -> SizeClass {
    SizeClass::new(block_size, blocks_per_page)
}

/// 64 classes from 8 bytes to 8 MiB.
///
/// Small classes step by 8 and pack 128 blocks per page; the step widens and
/// the page shrinks as blocks grow, ending in powers of two at 4 per page.
pub const DEFAULT_SIZE_CLASSES: [SizeClass; 64] = [
    // 8..=128, step 8
    class(8, 128),
    class(16, 128),
    class(24, 128),
    class(32, 128),
    class(40, 128),
    class(48, 128),
    class(56, 128),
    class(64, 128),
    class(72, 128),
    class(80, 128),
    class(88, 128),
    class(96, 128),
    class(104, 128),
    class(112, 128),
    class(120, 128),
    class(128, 128),
    // 144..=384, step 16
    class(144, 64),
    class(160, 64),
    class(176, 64),
    class(192, 64),
    class(208, 64),
    class(224, 64),
    class(240, 64),
    class(256, 64),
    class(272, 64),
    class(288, 64),
    class(304, 64),
    class(320, 64),
    class(336, 64),
    class(352, 64),
    class(368, 64),
    class(384, 64),
    // 416..=512, step 32
    class(416, 32),
    class(448, 32),
    class(480, 32),
    class(512, 32),
    // 576..=1024, step 64
    class(576, 16),
    class(640, 16),
    class(704, 16),
    class(768, 16),
    class(832, 16),
    class(896, 16),
    class(960, 16),
    class(1024, 16),
    // 1152..=2048, step 128
    class(1152, 8),
    class(1280, 8),
    class(1408, 8),
    class(1536, 8),
    class(1664, 8),
    class(1792, 8),
    class(1920, 8),
    class(2048, 8),
    // 4 KiB..=8 MiB, powers of two
    class(4096, 4),
    class(8192, 4),
    class(16384, 4),
    class(32768, 4),
    class(65536, 4),
    class(131_072, 4),
    class(262_144, 4),
    class(524_288, 4),
    class(1_048_576, 4),
    class(2_097_152, 4),
    class(4_194_304, 4),
    class(8_388_608, 4),
];
