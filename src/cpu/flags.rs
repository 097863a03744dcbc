// Flag register (F), the low byte of AF.
//
// Bit layout (7 → 0):
//
//     7 6 5 4 3 2 1 0
//     Z N H C 0 0 0 0
//     | | | +---------- Carry
//     | | +------------ Half Carry (carry out of bit 3 on add, borrow into bit 4 on sub)
//     | +-------------- Negative (set after a subtraction)
//     +---------------- Zero
//
// Bits 0–3 are not physically wired and always read zero.

pub const FLAG_CARRY: u8 = 1 << 4;
pub const FLAG_HALF_CARRY: u8 = 1 << 5;
pub const FLAG_NEGATIVE: u8 = 1 << 6;
pub const FLAG_ZERO: u8 = 1 << 7;
