use bytes::Bytes;
use nom::{
    branch::alt,
    combinator::{map, map_opt, rest, verify},
    error::Error,
    number::complete::be_u8,
    sequence::{preceded, tuple},
    IResult,
};

use super::Frame;
use crate::ash::{
    constants::{ERROR_CONTROL, RST_ACK_CONTROL, RST_CONTROL},
    FrameNumber,
};

pub type ParserResult<'a, T> = IResult<&'a [u8], T>;

pub fn data_control_byte(input: &[u8]) -> ParserResult<(FrameNumber, bool, FrameNumber)> {
    use nom::bits::bits;
    use nom::bits::complete::{bool, tag, take};

    bits::<_, _, Error<(&[u8], usize)>, _, _>(preceded(
        tag(0u8, 1usize),
        tuple((
            map_opt(take(3usize), FrameNumber::new),
            bool,
            map_opt(take(3usize), FrameNumber::new),
        )),
    ))(input)
}

fn ack_nak_control_byte(
    pattern: u8,
) -> impl Fn(&[u8]) -> ParserResult<(bool, bool, FrameNumber)> {
    use nom::bits::{
        bits,
        complete::{bool, tag, take},
    };
    move |input: &[u8]| {
        bits::<_, _, Error<(&[u8], usize)>, _, _>(preceded(
            tag(pattern, 3usize),
            tuple((bool, bool, map_opt(take(3usize), FrameNumber::new))),
        ))(input)
    }
}

pub fn ack_control_byte(input: &[u8]) -> ParserResult<(bool, bool, FrameNumber)> {
    ack_nak_control_byte(0b100)(input)
}

pub fn nak_control_byte(input: &[u8]) -> ParserResult<(bool, bool, FrameNumber)> {
    ack_nak_control_byte(0b101)(input)
}

fn control(expected: u8) -> impl Fn(&[u8]) -> ParserResult<u8> {
    move |input: &[u8]| verify(be_u8, |b: &u8| *b == expected)(input)
}

/// Parse a complete, unstuffed frame without its checksum. DATA bodies are
/// sliced out of `raw` without copying.
pub fn frame(raw: &Bytes) -> impl Fn(&[u8]) -> ParserResult<Frame> + '_ {
    move |input: &[u8]| {
        alt((
            map(
                tuple((data_control_byte, rest)),
                |((frm_num, re_tx, ack_num), body): (_, &[u8])| Frame::Data {
                    frm_num,
                    re_tx,
                    ack_num,
                    body: raw.slice_ref(body),
                },
            ),
            map(ack_control_byte, |(res, n_rdy, ack_num)| Frame::Ack {
                res,
                n_rdy,
                ack_num,
            }),
            map(nak_control_byte, |(res, n_rdy, ack_num)| Frame::Nak {
                res,
                n_rdy,
                ack_num,
            }),
            map(control(RST_CONTROL), |_| Frame::Rst),
            map(
                preceded(control(RST_ACK_CONTROL), tuple((be_u8, be_u8))),
                |(version, code)| Frame::RstAck { version, code },
            ),
            map(
                preceded(control(ERROR_CONTROL), tuple((be_u8, be_u8))),
                |(version, code)| Frame::Error { version, code },
            ),
        ))(input)
    }
}
