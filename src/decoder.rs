//! The depth-selective streaming decoder.
//!
//! A [`Decoder`] wraps a byte reader and parses top-level JSON values by
//! recursive descent, publishing a [`MetaValue`] for every value whose
//! nesting depth matches the configured emit depth. Parsing runs on its own
//! thread and hands values to the consumer through a bounded channel, so a
//! slow consumer applies backpressure all the way down to the reader.
//!
//! Containers are only populated when they sit inside the emit frontier;
//! everything shallower is traversed without being materialized, which keeps
//! memory bounded no matter how large the document is.

use std::io::Read;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::error::{DecoderError, SyntaxError, ERR_SYNTAX, ERR_UNEXPECTED_EOF};
use crate::scanner::Scanner;
use crate::scratch::Scratch;
use crate::value::{KeyValue, Map, Value, ValueType};

/// Capacity of the emission channel between producer and consumer.
const EMIT_CAPACITY: usize = 128;

/// A decoded value together with its position in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaValue {
    /// Byte offset of the value's first byte in the input stream.
    pub offset: u64,
    /// Number of input bytes spanned by the value, closing delimiter
    /// included.
    pub length: u64,
    /// Nesting depth at which the value lives; top-level values are depth 0.
    pub depth: usize,
    /// Path from the root to this value: one member name per enclosing
    /// object, one empty string per enclosing array.
    pub keys: Vec<String>,
    /// The decoded payload.
    pub value: Value,
    /// Type tag of the payload.
    pub value_type: ValueType,
}

/// Configuration for a [`Decoder`].
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use jsonsift::{Decoder, DecoderOptions};
///
/// let options = DecoderOptions {
///     emit_depth: 1,
///     emit_kv: true,
///     ..Default::default()
/// };
/// let decoder = Decoder::with_options(Cursor::new(b"{}".to_vec()), options);
/// # let _ = decoder;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DecoderOptions {
    /// Depth at which matched values are emitted. A negative value emits at
    /// depth 0 and enables recursive emission.
    pub emit_depth: i32,
    /// Emit values at every depth at or beyond `emit_depth`; enclosing
    /// containers are emitted after their contents.
    pub recursive: bool,
    /// Emit object members at the emit depth as key/value pairs carrying the
    /// member name.
    pub emit_kv: bool,
    /// Decode objects destined for emission as order-preserving pair lists
    /// instead of maps.
    pub object_as_kvs: bool,
}

/// Streaming JSON decoder over a byte reader.
///
/// Values are emitted the moment their closing delimiter is consumed, so
/// arbitrarily large documents and concatenated multi-document streams decode
/// in bounded memory. Construction is cheap; reading starts when
/// [`stream`](Decoder::stream) is called.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use jsonsift::{Decoder, Value};
///
/// let input = Cursor::new(br#"[1, "two", 3.5]"#.to_vec());
/// let mut stream = Decoder::new(input, 1).stream();
/// let values: Vec<_> = (&mut stream).map(|mv| mv.value).collect();
/// assert_eq!(
///     values,
///     vec![
///         Value::Integer(1),
///         Value::String("two".into()),
///         Value::Float(3.5),
///     ]
/// );
/// assert!(stream.err().is_none());
/// ```
pub struct Decoder<R> {
    reader: R,
    options: DecoderOptions,
}

impl<R: Read + Send + 'static> Decoder<R> {
    /// Creates a decoder emitting values at `emit_depth`.
    ///
    /// If `emit_depth` is negative, values at every depth are emitted.
    pub fn new(reader: R, emit_depth: i32) -> Self {
        Self::with_options(
            reader,
            DecoderOptions {
                emit_depth,
                ..DecoderOptions::default()
            },
        )
    }

    /// Creates a decoder from explicit [`DecoderOptions`].
    pub fn with_options(reader: R, options: DecoderOptions) -> Self {
        Self { reader, options }
    }

    /// Preserves object member order: objects decode to
    /// [`Value::OrderedObject`] instead of [`Value::Object`], keeping
    /// duplicate keys.
    #[must_use]
    pub fn object_as_kvs(mut self) -> Self {
        self.options.object_as_kvs = true;
        self
    }

    /// Emits object members at the emit depth as [`Value::KeyValue`] pairs
    /// carrying the member name instead of the bare value.
    #[must_use]
    pub fn emit_kv(mut self) -> Self {
        self.options.emit_kv = true;
        self
    }

    /// Emits all values at a depth at or beyond the configured emit depth;
    /// e.g. if an array is found at emit depth, all values within the array
    /// are emitted to the stream, then the array containing them.
    #[must_use]
    pub fn recursive(mut self) -> Self {
        self.options.recursive = true;
        self
    }

    /// Starts decoding on a producer thread and returns the stream of
    /// emitted values.
    pub fn stream(self) -> ValueStream {
        let (tx, rx) = bounded(EMIT_CAPACITY);
        let options = self.options;
        let (emit_depth, emit_recursive) = if options.emit_depth < 0 {
            (0, true)
        } else {
            (options.emit_depth as usize, options.recursive)
        };

        let producer = Producer {
            scanner: Scanner::new(self.reader),
            scratch: Scratch::new(),
            out: tx,
            emit_depth,
            emit_recursive,
            emit_kv: options.emit_kv,
            object_as_kvs: options.object_as_kvs,
            depth: 0,
            line_no: 0,
            line_start: 0,
        };
        let handle = thread::spawn(move || producer.run());

        ValueStream {
            rx,
            producer: Some(handle),
            outcome: None,
        }
    }
}

/// Final state of a finished producer.
struct Outcome {
    err: Option<DecoderError>,
    pos: u64,
}

/// Iterator over the values emitted by a running decoder.
///
/// Dropping the stream disconnects the emission channel; the producer notices
/// on its next send and stops reading. After the stream is exhausted the
/// terminal error and consumed byte count become available.
pub struct ValueStream {
    rx: Receiver<MetaValue>,
    producer: Option<JoinHandle<Outcome>>,
    outcome: Option<Outcome>,
}

impl Iterator for ValueStream {
    type Item = MetaValue;

    fn next(&mut self) -> Option<MetaValue> {
        match self.rx.recv() {
            Ok(mv) => Some(mv),
            Err(_) => {
                self.join();
                None
            }
        }
    }
}

impl ValueStream {
    fn join(&mut self) {
        if let Some(handle) = self.producer.take() {
            match handle.join() {
                Ok(outcome) => self.outcome = Some(outcome),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
    }

    /// Terminal decode error, if any. `None` until the stream is exhausted.
    #[must_use]
    pub fn err(&self) -> Option<&DecoderError> {
        self.outcome.as_ref().and_then(|o| o.err.as_ref())
    }

    /// Number of bytes consumed from the reader. Zero until the stream is
    /// exhausted.
    #[must_use]
    pub fn pos(&self) -> u64 {
        self.outcome.as_ref().map_or(0, |o| o.pos)
    }

    /// Drains any remaining values and returns the consumed byte count, or
    /// the terminal error.
    pub fn finish(mut self) -> Result<u64, DecoderError> {
        for _ in &mut self {}
        match self.outcome.take() {
            Some(Outcome { err: Some(e), .. }) => Err(e),
            Some(Outcome { pos, .. }) => Ok(pos),
            None => Ok(0),
        }
    }
}

/// Why a parse run stopped early.
enum Interrupt {
    /// The consumer dropped the stream; stop silently.
    Closed,
    /// A terminal error to report after the channel drains.
    Failed(DecoderError),
}

impl From<SyntaxError> for Interrupt {
    fn from(e: SyntaxError) -> Self {
        Interrupt::Failed(DecoderError::Syntax(e))
    }
}

impl From<DecoderError> for Interrupt {
    fn from(e: DecoderError) -> Self {
        Interrupt::Failed(e)
    }
}

/// Container under construction during object parsing; mapped or ordered
/// depending on configuration.
enum ObjectSink {
    Mapped(Map),
    Ordered(Vec<KeyValue>),
}

impl ObjectSink {
    fn new(ordered: bool) -> Self {
        if ordered {
            ObjectSink::Ordered(Vec::new())
        } else {
            ObjectSink::Mapped(Map::new())
        }
    }

    fn insert(&mut self, key: String, value: Value) {
        match self {
            // Duplicate keys keep the last value.
            ObjectSink::Mapped(map) => {
                map.insert(key, value);
            }
            // Duplicate keys keep every entry, in input order.
            ObjectSink::Ordered(entries) => entries.push(KeyValue { key, value }),
        }
    }

    fn into_value(self) -> Value {
        match self {
            ObjectSink::Mapped(map) => Value::Object(map),
            ObjectSink::Ordered(entries) => Value::OrderedObject(entries),
        }
    }
}

/// The parsing half of a decoder, running on its own thread.
struct Producer {
    scanner: Scanner,
    scratch: Scratch,
    out: Sender<MetaValue>,
    emit_depth: usize,
    emit_recursive: bool,
    emit_kv: bool,
    object_as_kvs: bool,
    depth: usize,
    // line position, for error context
    line_no: usize,
    line_start: u64,
}

impl Producer {
    /// Top-level loop: parse whitespace-separated values until the input is
    /// exhausted or an error terminates the run.
    fn run(mut self) -> Outcome {
        let mut err = None;

        self.skip_spaces();
        while self.scanner.pos() < self.scanner.end() {
            match self.emit_any(&[]) {
                Ok(_) => {}
                Err(Interrupt::Closed) => break,
                Err(Interrupt::Failed(e)) => {
                    err = Some(e);
                    break;
                }
            }
            self.skip_spaces();
        }

        if let Some(failure) = self.scanner.take_failure() {
            err = Some(DecoderError::Read(failure));
        }
        if let Some(e) = &err {
            tracing::debug!(error = %e, pos = self.scanner.pos(), "decode terminated");
        }

        Outcome {
            err,
            pos: self.scanner.pos(),
        }
    }

    /// Parses one value and publishes it when the current depth matches the
    /// emission gate. Returns the value for the caller to retain when its
    /// container will itself be emitted.
    fn emit_any(&mut self, keys: &[String]) -> Result<Value, Interrupt> {
        if self.scanner.pos() >= self.scanner.end() {
            return Err(self.unexpected_eof().into());
        }
        let offset = self.scanner.pos() - 1;
        let (mut value, value_type) = self.parse_any(keys)?;
        if self.will_emit() {
            let payload = if self.depth > self.emit_depth {
                // Recursive emission: the enclosing container keeps the
                // original, the stream gets a copy.
                value.clone()
            } else {
                std::mem::take(&mut value)
            };
            self.publish(offset, keys, payload, value_type)?;
        }
        Ok(value)
    }

    /// Whether a value parsed at the current depth is emitted to the stream.
    fn will_emit(&self) -> bool {
        if self.emit_recursive {
            self.depth >= self.emit_depth
        } else {
            self.depth == self.emit_depth
        }
    }

    fn publish(
        &mut self,
        offset: u64,
        keys: &[String],
        value: Value,
        value_type: ValueType,
    ) -> Result<(), Interrupt> {
        let mv = MetaValue {
            offset,
            length: self.scanner.pos() - offset,
            depth: self.depth,
            keys: keys.to_vec(),
            value,
            value_type,
        };
        self.out.send(mv).map_err(|_| Interrupt::Closed)
    }

    /// Dispatches on the current byte to the matching value parser.
    fn parse_any(&mut self, keys: &[String]) -> Result<(Value, ValueType), Interrupt> {
        match self.scanner.cur() {
            b'"' => Ok((Value::String(self.parse_string()?), ValueType::String)),
            b'0'..=b'9' => Ok((self.parse_number()?, ValueType::Number)),
            b'-' => {
                if !self.scanner.next().is_ascii_digit() {
                    return Err(self.syntax("in negative numeric literal").into());
                }
                let value = match self.parse_number()? {
                    Value::Integer(n) => Value::Integer(-n),
                    Value::Float(n) => Value::Float(-n),
                    other => other,
                };
                Ok((value, ValueType::Number))
            }
            b'f' => {
                if self.scanner.remaining() < 4 {
                    return Err(self.unexpected_eof().into());
                }
                if self.scanner.next() == b'a'
                    && self.scanner.next() == b'l'
                    && self.scanner.next() == b's'
                    && self.scanner.next() == b'e'
                {
                    Ok((Value::Boolean(false), ValueType::Boolean))
                } else {
                    Err(self.syntax("in literal false").into())
                }
            }
            b't' => {
                if self.scanner.remaining() < 3 {
                    return Err(self.unexpected_eof().into());
                }
                if self.scanner.next() == b'r'
                    && self.scanner.next() == b'u'
                    && self.scanner.next() == b'e'
                {
                    Ok((Value::Boolean(true), ValueType::Boolean))
                } else {
                    Err(self.syntax("in literal true").into())
                }
            }
            b'n' => {
                if self.scanner.remaining() < 3 {
                    return Err(self.unexpected_eof().into());
                }
                if self.scanner.next() == b'u'
                    && self.scanner.next() == b'l'
                    && self.scanner.next() == b'l'
                {
                    Ok((Value::Null, ValueType::Null))
                } else {
                    Err(self.syntax("in literal null").into())
                }
            }
            b'[' => Ok((self.parse_array(keys)?, ValueType::Array)),
            b'{' => Ok((self.parse_object(keys)?, ValueType::Object)),
            _ => Err(self.syntax("looking for beginning of value").into()),
        }
    }

    /// Parses a string literal after its opening quote has been consumed.
    fn parse_string(&mut self) -> Result<String, Interrupt> {
        self.scratch.reset();
        let mut c = self.scanner.next();
        loop {
            match c {
                b'"' => return Ok(self.scratch.take_string()),
                b'\\' => {
                    let esc = self.scanner.next();
                    c = self.scan_escape(esc)?;
                }
                _ if c < 0x20 => return Err(self.syntax("in string literal").into()),
                _ => {
                    self.scratch.push(c);
                    if self.scanner.remaining() == 0 {
                        return Err(self.syntax("in string literal").into());
                    }
                    c = self.scanner.next();
                }
            }
        }
    }

    /// Decodes one escape sequence and returns the next byte to process.
    fn scan_escape(&mut self, c: u8) -> Result<u8, Interrupt> {
        match c {
            b'"' | b'\\' | b'/' | b'\'' => self.scratch.push(c),
            b'u' => return self.scan_unicode(),
            b'b' => self.scratch.push(0x08),
            b'f' => self.scratch.push(0x0C),
            b'n' => self.scratch.push(b'\n'),
            b'r' => self.scratch.push(b'\r'),
            b't' => self.scratch.push(b'\t'),
            _ => return Err(self.syntax("in string escape code").into()),
        }
        Ok(self.scanner.next())
    }

    /// Decodes a `\uXXXX` escape, combining a UTF-16 surrogate pair into a
    /// single code point when one follows. A lone surrogate half becomes
    /// U+FFFD; the byte that broke the pair is handed back for reprocessing.
    fn scan_unicode(&mut self) -> Result<u8, Interrupt> {
        let Some(r) = self.hex4() else {
            return Err(self.syntax("in unicode escape sequence").into());
        };

        let c = self.scanner.next();
        if !is_surrogate(r) || c != b'\\' {
            self.push_code_point(r);
            return Ok(c);
        }
        let c = self.scanner.next();
        if c != b'u' {
            self.push_code_point(r);
            return self.scan_escape(c);
        }

        let Some(r2) = self.hex4() else {
            return Err(self.syntax("in unicode escape sequence").into());
        };
        self.scratch.push_char(combine_surrogates(r, r2));
        Ok(self.scanner.next())
    }

    /// Reads four hex digits following a `\u` escape.
    fn hex4(&mut self) -> Option<u32> {
        let mut r: u32 = 0;
        for _ in 0..4 {
            let c = self.scanner.next();
            let digit = match c {
                b'0'..=b'9' => c - b'0',
                b'A'..=b'F' => c - b'A' + 10,
                b'a'..=b'f' => c - b'a' + 10,
                _ => return None,
            };
            r = r << 4 | u32::from(digit);
        }
        Some(r)
    }

    fn push_code_point(&mut self, r: u32) {
        self.scratch
            .push_char(char::from_u32(r).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    /// Parses a numeric literal starting at the current digit. The byte that
    /// terminated the literal is pushed back for the caller to re-dispatch.
    fn parse_number(&mut self) -> Result<Value, Interrupt> {
        self.scratch.reset();
        let mut c = self.scanner.cur();
        let mut is_float = false;

        // digits first; a leading zero stands alone
        if c == b'0' {
            self.scratch.push(c);
            c = self.scanner.next();
        } else if (b'1'..=b'9').contains(&c) {
            while c.is_ascii_digit() {
                self.scratch.push(c);
                c = self.scanner.next();
            }
        }

        // . followed by 1 or more digits
        if c == b'.' {
            is_float = true;
            self.scratch.push(c);
            c = self.scanner.next();
            if !c.is_ascii_digit() {
                return Err(self.syntax("after decimal point in numeric literal").into());
            }
            self.scratch.push(c);
            loop {
                c = self.scanner.next();
                if !c.is_ascii_digit() {
                    break;
                }
                self.scratch.push(c);
            }
        }

        // e or E followed by an optional sign and 1 or more digits
        if c == b'e' || c == b'E' {
            is_float = true;
            self.scratch.push(c);
            c = self.scanner.next();
            if c == b'+' || c == b'-' {
                self.scratch.push(c);
                c = self.scanner.next();
                if !c.is_ascii_digit() {
                    return Err(self.syntax("in exponent of numeric literal").into());
                }
            }
            while c.is_ascii_digit() {
                self.scratch.push(c);
                c = self.scanner.next();
            }
        }

        self.scanner.back();

        let text = self.scratch.as_str();
        if is_float {
            let n = text.parse::<f64>().map_err(DecoderError::from)?;
            Ok(Value::Float(n))
        } else {
            let n = text.parse::<i64>().map_err(DecoderError::from)?;
            Ok(Value::Integer(n))
        }
    }

    fn parse_array(&mut self, keys: &[String]) -> Result<Value, Interrupt> {
        self.depth += 1;
        let result = self.array_body(keys);
        self.depth -= 1;
        result
    }

    fn array_body(&mut self, parent_keys: &[String]) -> Result<Value, Interrupt> {
        // Each level extends its own copy of the path so sibling branches
        // never alias.
        let mut keys = parent_keys.to_vec();
        keys.push(String::new());

        let mut array = Vec::new();
        let retain = self.depth > self.emit_depth;

        if self.skip_spaces() == b']' {
            return Ok(Value::Array(array));
        }
        loop {
            let value = self.emit_any(&keys)?;
            if retain {
                array.push(value);
            }
            match self.skip_spaces() {
                b',' => {
                    self.skip_spaces();
                }
                b']' => return Ok(Value::Array(array)),
                _ => return Err(self.syntax("after array element").into()),
            }
        }
    }

    fn parse_object(&mut self, keys: &[String]) -> Result<Value, Interrupt> {
        self.depth += 1;
        let result = self.object_body(keys);
        self.depth -= 1;
        result
    }

    fn object_body(&mut self, parent_keys: &[String]) -> Result<Value, Interrupt> {
        let mut sink = ObjectSink::new(self.object_as_kvs);
        let retain = self.depth > self.emit_depth;

        let mut c = self.skip_spaces();
        if c == b'}' {
            return Ok(sink.into_value());
        }
        loop {
            // Anchor key/value emissions at the member's opening quote.
            let offset = self.scanner.pos() - 1;

            if c != b'"' {
                return Err(self
                    .syntax("looking for beginning of object key string")
                    .into());
            }
            let key = self.parse_string()?;

            if self.skip_spaces() != b':' {
                return Err(self.syntax("after object key").into());
            }

            self.skip_spaces();
            let mut keys = parent_keys.to_vec();
            keys.push(key.clone());

            let value = if self.emit_kv {
                let (mut value, value_type) = self.parse_any(&keys)?;
                if self.will_emit() {
                    let payload = if retain {
                        value.clone()
                    } else {
                        std::mem::take(&mut value)
                    };
                    let pair = Value::KeyValue(Box::new(KeyValue {
                        key: key.clone(),
                        value: payload,
                    }));
                    self.publish(offset, &keys, pair, value_type)?;
                }
                value
            } else {
                self.emit_any(&keys)?
            };

            if retain {
                sink.insert(key, value);
            }

            match self.skip_spaces() {
                b'}' => return Ok(sink.into_value()),
                b',' => c = self.skip_spaces(),
                _ => return Err(self.syntax("after object key:value pair").into()),
            }
        }
    }

    /// Consumes whitespace and returns the first byte after it, tracking line
    /// starts for error positions.
    fn skip_spaces(&mut self) -> u8 {
        while self.scanner.pos() < self.scanner.end() {
            match self.scanner.next() {
                b'\n' => {
                    self.line_start = self.scanner.pos();
                    self.line_no += 1;
                }
                b' ' | b'\t' | b'\r' => {}
                c => return c,
            }
        }
        0
    }

    fn syntax(&self, context: &'static str) -> SyntaxError {
        SyntaxError {
            context,
            ..self.stamp(ERR_SYNTAX)
        }
    }

    fn unexpected_eof(&self) -> SyntaxError {
        self.stamp(ERR_UNEXPECTED_EOF)
    }

    /// Clones an error template and stamps the current position and byte.
    fn stamp(&self, template: SyntaxError) -> SyntaxError {
        SyntaxError {
            at: self.scanner.cur(),
            line: self.line_no + 1,
            column: (self.scanner.pos() - self.line_start) as usize,
            ..template
        }
    }
}

fn is_surrogate(r: u32) -> bool {
    (0xD800..0xE000).contains(&r)
}

/// Combines a UTF-16 surrogate pair into its code point, or U+FFFD if the
/// two halves do not form a valid pair.
fn combine_surrogates(hi: u32, lo: u32) -> char {
    if (0xD800..0xDC00).contains(&hi) && (0xDC00..0xE000).contains(&lo) {
        char::from_u32(0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00))
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    } else {
        char::REPLACEMENT_CHARACTER
    }
}
