//! The IMAP4rev1 response grammar (RFC 3501 section 9) as a rule table.
//!
//! Alternatives are ordered: the first one that matches wins, so longer
//! keywords sharing a prefix (`RFC822.SIZE` before `RFC822`, `BODYSTRUCTURE`
//! before `BODY`) are listed first.

use super::terminal::Terminal;

macro_rules! rules {
    ($($variant:ident => $name:literal,)+) => {
        /// A production of the IMAP response grammar.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Rule {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl Rule {
            /// Every rule, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Number of rules in the grammar.
            pub const COUNT: usize = Self::ALL.len();

            /// ABNF name of the rule.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }
    };
}

rules! {
    Response => "response",
    Greeting => "greeting",
    ContinueReq => "continue-req",
    ResponseData => "response-data",
    ResponseDone => "response-done",
    ResponseTagged => "response-tagged",
    ResponseFatal => "response-fatal",
    Tag => "tag",
    RespCondAuth => "resp-cond-auth",
    RespCondState => "resp-cond-state",
    RespCondBye => "resp-cond-bye",
    RespText => "resp-text",
    RespTextCode => "resp-text-code",
    CodePermanentFlags => "code-permanentflags",
    CodeReadOnly => "code-read-only",
    CodeReadWrite => "code-read-write",
    CodeTryCreate => "code-trycreate",
    CodeUidNext => "code-uidnext",
    CodeUidValidity => "code-uidvalidity",
    CodeUnseen => "code-unseen",
    CodeOther => "code-other",
    Text => "text",
    CapabilityData => "capability-data",
    Capability => "capability",
    MailboxData => "mailbox-data",
    MailboxExists => "mailbox-exists",
    MailboxRecent => "mailbox-recent",
    MailboxList => "mailbox-list",
    MbxListFlags => "mbx-list-flags",
    MbxListFlag => "mbx-list-flag",
    Delimiter => "delimiter",
    Mailbox => "mailbox",
    StatusAttList => "status-att-list",
    NamespaceData => "namespace-response",
    FlagList => "flag-list",
    Flag => "flag",
    FlagPerm => "flag-perm",
    MessageExpunge => "message-expunge",
    MessageData => "message-data",
    MsgAtt => "msg-att",
    AttFlags => "att-flags",
    AttEnvelope => "att-envelope",
    AttInternalDate => "att-internaldate",
    AttRfc822Size => "att-rfc822-size",
    AttRfc822Header => "att-rfc822-header",
    AttRfc822Text => "att-rfc822-text",
    AttRfc822 => "att-rfc822",
    AttBodyStructure => "att-bodystructure",
    AttBodySection => "att-body-section",
    AttBody => "att-body",
    AttUid => "att-uid",
    DateTime => "date-time",
    Envelope => "envelope",
    EnvDate => "env-date",
    EnvSubject => "env-subject",
    EnvFrom => "env-from",
    EnvSender => "env-sender",
    EnvReplyTo => "env-reply-to",
    EnvTo => "env-to",
    EnvCc => "env-cc",
    EnvBcc => "env-bcc",
    EnvInReplyTo => "env-in-reply-to",
    EnvMessageId => "env-message-id",
    Address => "address",
    AddrName => "addr-name",
    AddrAdl => "addr-adl",
    AddrMailbox => "addr-mailbox",
    AddrHost => "addr-host",
    Body => "body",
    BodyType1Part => "body-type-1part",
    BodyTypeMpart => "body-type-mpart",
    BodyTypeBasic => "body-type-basic",
    BodyTypeMsg => "body-type-msg",
    BodyTypeText => "body-type-text",
    MediaType => "media-type",
    MediaSubtype => "media-subtype",
    BodyFields => "body-fields",
    BodyFldParam => "body-fld-param",
    BodyFldId => "body-fld-id",
    BodyFldDesc => "body-fld-desc",
    BodyFldEnc => "body-fld-enc",
    BodyFldOctets => "body-fld-octets",
    BodyFldLines => "body-fld-lines",
    BodyFldMd5 => "body-fld-md5",
    BodyFldDsp => "body-fld-dsp",
    BodyFldLang => "body-fld-lang",
    BodyFldLoc => "body-fld-loc",
    BodyExtension => "body-extension",
    BodyExt1Part => "body-ext-1part",
    BodyExtMpart => "body-ext-mpart",
    Section => "section",
    SectionSpec => "section-spec",
    SectionMsgtext => "section-msgtext",
    SectionPart => "section-part",
    SectionText => "section-text",
    HeaderList => "header-list",
    SectionOrigin => "section-origin",
    Astring => "astring",
    Nstring => "nstring",
    String => "string",
    Quoted => "quoted",
    Literal => "literal",
    LiteralSize => "literal-size",
    LiteralData => "literal-data",
    Atom => "atom",
    Nil => "nil",
    Number => "number",
    NzNumber => "nz-number",
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Single-byte character classes from the RFC 3501 core rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Digit,
    DigitNz,
    Alpha,
    /// Any byte except NUL, CR and LF.
    TextChar,
    AtomChar,
    /// `ATOM-CHAR` plus `]`.
    AstringChar,
    /// `ASTRING-CHAR` except `+`.
    TagChar,
    QuotedSafe,
    QuotedSpecial,
    /// `TEXT-CHAR` except `]`.
    RespTextCodeChar,
}

const fn is_atom_special(c: u8) -> bool {
    matches!(
        c,
        b'(' | b')' | b'{' | b' ' | 0x00..=0x1f | 0x7f | b'%' | b'*' | b'"' | b'\\' | b']'
    )
}

impl CharClass {
    /// Returns true if `c` belongs to this class.
    #[must_use]
    pub const fn contains(self, c: u8) -> bool {
        match self {
            Self::Digit => c.is_ascii_digit(),
            Self::DigitNz => matches!(c, b'1'..=b'9'),
            Self::Alpha => c.is_ascii_alphabetic(),
            Self::TextChar => !matches!(c, 0 | b'\r' | b'\n'),
            Self::AtomChar => c.is_ascii() && !is_atom_special(c),
            Self::AstringChar => Self::AtomChar.contains(c) || c == b']',
            Self::TagChar => Self::AstringChar.contains(c) && c != b'+',
            Self::QuotedSafe => Self::TextChar.contains(c) && c != b'"' && c != b'\\',
            Self::QuotedSpecial => c == b'"' || c == b'\\',
            Self::RespTextCodeChar => Self::TextChar.contains(c) && c != b']',
        }
    }
}

/// A grammar expression.
#[derive(Debug, Clone)]
pub enum Node {
    /// Ordered choice.
    Alt(Vec<Node>),
    /// Sequence.
    Cat(Vec<Node>),
    /// Greedy repetition, `max: None` is unbounded.
    Repeat {
        min: u32,
        max: Option<u32>,
        node: Box<Node>,
    },
    /// Reference to another rule.
    Rule(Rule),
    /// Case-insensitive keyword.
    Keyword(&'static [u8]),
    /// Exact byte.
    Byte(u8),
    Class(CharClass),
    Terminal(Terminal),
}

/// The rule table, indexed by [`Rule`].
#[derive(Debug)]
pub struct Grammar {
    definitions: Vec<Node>,
}

impl Grammar {
    /// Builds the IMAP response grammar.
    #[must_use]
    pub fn imap() -> Self {
        Self {
            definitions: Rule::ALL.iter().map(|&rule| definition(rule)).collect(),
        }
    }

    /// Returns the expression a rule expands to.
    #[must_use]
    pub fn definition(&self, rule: Rule) -> &Node {
        &self.definitions[rule as usize]
    }
}

fn alt<const N: usize>(options: [Node; N]) -> Node {
    Node::Alt(options.into())
}

fn cat<const N: usize>(items: [Node; N]) -> Node {
    Node::Cat(items.into())
}

fn repeat(min: u32, max: Option<u32>, node: Node) -> Node {
    Node::Repeat {
        min,
        max,
        node: Box::new(node),
    }
}

fn opt(node: Node) -> Node {
    repeat(0, Some(1), node)
}

fn many(node: Node) -> Node {
    repeat(0, None, node)
}

fn many1(node: Node) -> Node {
    repeat(1, None, node)
}

fn exactly(n: u32, node: Node) -> Node {
    repeat(n, Some(n), node)
}

const fn r(rule: Rule) -> Node {
    Node::Rule(rule)
}

const fn kw(word: &'static [u8]) -> Node {
    Node::Keyword(word)
}

const fn byte(b: u8) -> Node {
    Node::Byte(b)
}

const fn class(c: CharClass) -> Node {
    Node::Class(c)
}

const fn sp() -> Node {
    byte(b' ')
}

const fn dquote() -> Node {
    byte(b'"')
}

fn crlf() -> Node {
    cat([byte(b'\r'), byte(b'\n')])
}

const fn digit() -> Node {
    class(CharClass::Digit)
}

/// `"(" item *(SP item) ")"`
fn paren_list(item: Node) -> Node {
    cat([
        byte(b'('),
        item.clone(),
        many(cat([sp(), item])),
        byte(b')'),
    ])
}

/// `"(" [item *(SP item)] ")"`
fn paren_list0(item: Node) -> Node {
    cat([
        byte(b'('),
        opt(cat([item.clone(), many(cat([sp(), item]))])),
        byte(b')'),
    ])
}

fn quoted_char() -> Node {
    alt([
        class(CharClass::QuotedSafe),
        cat([byte(b'\\'), class(CharClass::QuotedSpecial)]),
    ])
}

fn address_list() -> Node {
    alt([
        cat([byte(b'('), many1(r(Rule::Address)), byte(b')')]),
        r(Rule::Nil),
    ])
}

/// `first [SP body-fld-dsp [SP body-fld-lang [SP body-fld-loc *(SP body-extension)]]]`
fn body_ext(first: Rule) -> Node {
    cat([
        r(first),
        opt(cat([
            sp(),
            r(Rule::BodyFldDsp),
            opt(cat([
                sp(),
                r(Rule::BodyFldLang),
                opt(cat([
                    sp(),
                    r(Rule::BodyFldLoc),
                    many(cat([sp(), r(Rule::BodyExtension)])),
                ])),
            ])),
        ])),
    ])
}

#[allow(clippy::too_many_lines)]
fn definition(rule: Rule) -> Node {
    use CharClass as C;
    use Rule as R;

    match rule {
        R::Response => cat([
            many(alt([r(R::ContinueReq), r(R::ResponseData)])),
            r(R::ResponseDone),
        ]),
        R::Greeting => cat([
            byte(b'*'),
            sp(),
            alt([r(R::RespCondAuth), r(R::RespCondBye)]),
            crlf(),
        ]),
        R::ContinueReq => cat([byte(b'+'), opt(cat([sp(), r(R::RespText)])), crlf()]),
        R::ResponseData => cat([
            byte(b'*'),
            sp(),
            alt([
                r(R::RespCondState),
                r(R::RespCondBye),
                r(R::MailboxData),
                r(R::MessageExpunge),
                r(R::MessageData),
                r(R::CapabilityData),
                r(R::NamespaceData),
            ]),
            crlf(),
        ]),
        R::ResponseDone => alt([r(R::ResponseTagged), r(R::ResponseFatal)]),
        R::ResponseTagged => cat([r(R::Tag), sp(), r(R::RespCondState), crlf()]),
        R::ResponseFatal => cat([byte(b'*'), sp(), r(R::RespCondBye), crlf()]),
        R::Tag => many1(class(C::TagChar)),
        R::RespCondAuth => cat([
            alt([kw(b"OK"), kw(b"PREAUTH")]),
            opt(cat([sp(), r(R::RespText)])),
        ]),
        R::RespCondState => cat([
            alt([kw(b"OK"), kw(b"NO"), kw(b"BAD")]),
            opt(cat([sp(), r(R::RespText)])),
        ]),
        R::RespCondBye => cat([kw(b"BYE"), opt(cat([sp(), r(R::RespText)]))]),
        R::RespText => cat([
            opt(cat([
                byte(b'['),
                r(R::RespTextCode),
                byte(b']'),
                opt(sp()),
            ])),
            opt(r(R::Text)),
        ]),
        R::RespTextCode => alt([
            r(R::CodePermanentFlags),
            r(R::CodeReadOnly),
            r(R::CodeReadWrite),
            r(R::CodeTryCreate),
            r(R::CodeUidNext),
            r(R::CodeUidValidity),
            r(R::CodeUnseen),
            r(R::CapabilityData),
            r(R::CodeOther),
        ]),
        R::CodePermanentFlags => cat([kw(b"PERMANENTFLAGS"), sp(), paren_list0(r(R::FlagPerm))]),
        R::CodeReadOnly => kw(b"READ-ONLY"),
        R::CodeReadWrite => kw(b"READ-WRITE"),
        R::CodeTryCreate => kw(b"TRYCREATE"),
        R::CodeUidNext => cat([kw(b"UIDNEXT"), sp(), r(R::Number)]),
        R::CodeUidValidity => cat([kw(b"UIDVALIDITY"), sp(), r(R::Number)]),
        R::CodeUnseen => cat([kw(b"UNSEEN"), sp(), r(R::Number)]),
        R::CodeOther => cat([
            r(R::Atom),
            opt(cat([sp(), many1(class(C::RespTextCodeChar))])),
        ]),
        R::Text => many1(class(C::TextChar)),
        R::CapabilityData => cat([kw(b"CAPABILITY"), many1(cat([sp(), r(R::Capability)]))]),
        R::Capability => r(R::Atom),
        R::Mailbox => r(R::Astring),
        R::MbxListFlags => cat([
            r(R::MbxListFlag),
            many(cat([sp(), r(R::MbxListFlag)])),
        ]),
        R::StatusAttList => {
            let item = cat([r(R::Atom), sp(), r(R::Number)]);
            cat([item.clone(), many(cat([sp(), item]))])
        }
        R::MailboxData => alt([
            cat([kw(b"FLAGS"), sp(), r(R::FlagList)]),
            cat([kw(b"LIST"), sp(), r(R::MailboxList)]),
            cat([kw(b"LSUB"), sp(), r(R::MailboxList)]),
            cat([kw(b"SEARCH"), many(cat([sp(), r(R::NzNumber)]))]),
            cat([
                kw(b"STATUS"),
                sp(),
                r(R::Mailbox),
                sp(),
                byte(b'('),
                opt(r(R::StatusAttList)),
                byte(b')'),
            ]),
            r(R::MailboxExists),
            r(R::MailboxRecent),
        ]),
        R::MailboxExists => cat([r(R::Number), sp(), kw(b"EXISTS")]),
        R::MailboxRecent => cat([r(R::Number), sp(), kw(b"RECENT")]),
        R::MailboxList => cat([
            byte(b'('),
            opt(r(R::MbxListFlags)),
            byte(b')'),
            sp(),
            r(R::Delimiter),
            sp(),
            r(R::Mailbox),
        ]),
        R::MbxListFlag => cat([byte(b'\\'), r(R::Atom)]),
        R::Delimiter => alt([cat([dquote(), quoted_char(), dquote()]), r(R::Nil)]),
        R::NamespaceData => cat([kw(b"NAMESPACE"), sp(), r(R::Text)]),
        R::FlagList => paren_list0(r(R::Flag)),
        R::Flag => alt([cat([byte(b'\\'), r(R::Atom)]), r(R::Atom)]),
        R::FlagPerm => alt([cat([byte(b'\\'), byte(b'*')]), r(R::Flag)]),
        R::MessageExpunge => cat([r(R::NzNumber), sp(), kw(b"EXPUNGE")]),
        R::MessageData => cat([r(R::NzNumber), sp(), kw(b"FETCH"), sp(), r(R::MsgAtt)]),
        R::MsgAtt => paren_list(alt([
            r(R::AttFlags),
            r(R::AttEnvelope),
            r(R::AttInternalDate),
            r(R::AttRfc822Size),
            r(R::AttRfc822Header),
            r(R::AttRfc822Text),
            r(R::AttRfc822),
            r(R::AttBodyStructure),
            r(R::AttBodySection),
            r(R::AttBody),
            r(R::AttUid),
        ])),
        R::AttFlags => cat([kw(b"FLAGS"), sp(), paren_list0(r(R::Flag))]),
        R::AttEnvelope => cat([kw(b"ENVELOPE"), sp(), r(R::Envelope)]),
        R::AttInternalDate => cat([kw(b"INTERNALDATE"), sp(), r(R::DateTime)]),
        R::AttRfc822Size => cat([kw(b"RFC822.SIZE"), sp(), r(R::Number)]),
        R::AttRfc822Header => cat([kw(b"RFC822.HEADER"), sp(), r(R::Nstring)]),
        R::AttRfc822Text => cat([kw(b"RFC822.TEXT"), sp(), r(R::Nstring)]),
        R::AttRfc822 => cat([kw(b"RFC822"), sp(), r(R::Nstring)]),
        R::AttBodyStructure => cat([kw(b"BODYSTRUCTURE"), sp(), r(R::Body)]),
        R::AttBodySection => cat([
            kw(b"BODY"),
            r(R::Section),
            opt(r(R::SectionOrigin)),
            sp(),
            r(R::Nstring),
        ]),
        R::AttBody => cat([kw(b"BODY"), sp(), r(R::Body)]),
        R::AttUid => cat([kw(b"UID"), sp(), r(R::NzNumber)]),
        R::DateTime => cat([
            dquote(),
            alt([cat([sp(), digit()]), cat([digit(), opt(digit())])]),
            byte(b'-'),
            exactly(3, class(C::Alpha)),
            byte(b'-'),
            exactly(4, digit()),
            sp(),
            exactly(2, digit()),
            byte(b':'),
            exactly(2, digit()),
            byte(b':'),
            exactly(2, digit()),
            sp(),
            alt([byte(b'+'), byte(b'-')]),
            exactly(4, digit()),
            dquote(),
        ]),
        R::Envelope => cat([
            byte(b'('),
            r(R::EnvDate),
            sp(),
            r(R::EnvSubject),
            sp(),
            r(R::EnvFrom),
            sp(),
            r(R::EnvSender),
            sp(),
            r(R::EnvReplyTo),
            sp(),
            r(R::EnvTo),
            sp(),
            r(R::EnvCc),
            sp(),
            r(R::EnvBcc),
            sp(),
            r(R::EnvInReplyTo),
            sp(),
            r(R::EnvMessageId),
            byte(b')'),
        ]),
        R::EnvDate
        | R::EnvSubject
        | R::EnvInReplyTo
        | R::EnvMessageId
        | R::AddrName
        | R::AddrAdl
        | R::AddrMailbox
        | R::AddrHost
        | R::BodyFldId
        | R::BodyFldDesc
        | R::BodyFldMd5
        | R::BodyFldLoc => r(R::Nstring),
        R::EnvFrom | R::EnvSender | R::EnvReplyTo | R::EnvTo | R::EnvCc | R::EnvBcc => {
            address_list()
        }
        R::Address => cat([
            byte(b'('),
            r(R::AddrName),
            sp(),
            r(R::AddrAdl),
            sp(),
            r(R::AddrMailbox),
            sp(),
            r(R::AddrHost),
            byte(b')'),
        ]),
        R::Body => cat([
            byte(b'('),
            alt([r(R::BodyType1Part), r(R::BodyTypeMpart)]),
            byte(b')'),
        ]),
        R::BodyType1Part => cat([
            alt([r(R::BodyTypeText), r(R::BodyTypeMsg), r(R::BodyTypeBasic)]),
            opt(cat([sp(), r(R::BodyExt1Part)])),
        ]),
        R::BodyTypeMpart => cat([
            r(R::Body),
            many(cat([opt(sp()), r(R::Body)])),
            sp(),
            r(R::MediaSubtype),
            opt(cat([sp(), r(R::BodyExtMpart)])),
        ]),
        R::BodyTypeBasic => cat([
            r(R::MediaType),
            sp(),
            r(R::MediaSubtype),
            sp(),
            r(R::BodyFields),
        ]),
        R::BodyTypeMsg => cat([
            dquote(),
            kw(b"MESSAGE"),
            dquote(),
            sp(),
            dquote(),
            kw(b"RFC822"),
            dquote(),
            sp(),
            r(R::BodyFields),
            sp(),
            r(R::Envelope),
            sp(),
            r(R::Body),
            sp(),
            r(R::BodyFldLines),
        ]),
        R::BodyTypeText => cat([
            dquote(),
            kw(b"TEXT"),
            dquote(),
            sp(),
            r(R::MediaSubtype),
            sp(),
            r(R::BodyFields),
            sp(),
            r(R::BodyFldLines),
        ]),
        R::MediaType | R::MediaSubtype | R::BodyFldEnc => r(R::String),
        R::BodyFields => cat([
            r(R::BodyFldParam),
            sp(),
            r(R::BodyFldId),
            sp(),
            r(R::BodyFldDesc),
            sp(),
            r(R::BodyFldEnc),
            sp(),
            r(R::BodyFldOctets),
        ]),
        R::BodyFldParam => alt([
            paren_list(cat([r(R::String), sp(), r(R::String)])),
            r(R::Nil),
        ]),
        R::BodyFldOctets | R::BodyFldLines => r(R::Number),
        R::BodyFldDsp => alt([
            cat([
                byte(b'('),
                r(R::String),
                sp(),
                r(R::BodyFldParam),
                byte(b')'),
            ]),
            r(R::Nil),
        ]),
        R::BodyFldLang => alt([r(R::Nstring), paren_list(r(R::String))]),
        R::BodyExtension => alt([
            r(R::Nstring),
            r(R::Number),
            paren_list(r(R::BodyExtension)),
        ]),
        R::BodyExt1Part => body_ext(R::BodyFldMd5),
        R::BodyExtMpart => body_ext(R::BodyFldParam),
        R::Section => cat([byte(b'['), opt(r(R::SectionSpec)), byte(b']')]),
        R::SectionSpec => alt([
            r(R::SectionMsgtext),
            cat([
                r(R::SectionPart),
                opt(cat([byte(b'.'), r(R::SectionText)])),
            ]),
        ]),
        R::SectionMsgtext => alt([
            cat([
                kw(b"HEADER.FIELDS"),
                opt(kw(b".NOT")),
                sp(),
                r(R::HeaderList),
            ]),
            kw(b"HEADER"),
            kw(b"TEXT"),
        ]),
        R::SectionPart => cat([
            r(R::NzNumber),
            many(cat([byte(b'.'), r(R::NzNumber)])),
        ]),
        R::SectionText => alt([r(R::SectionMsgtext), kw(b"MIME")]),
        R::HeaderList => paren_list(r(R::Astring)),
        R::SectionOrigin => cat([byte(b'<'), r(R::Number), byte(b'>')]),
        R::Astring => alt([many1(class(C::AstringChar)), r(R::String)]),
        R::Nstring => alt([r(R::String), r(R::Nil)]),
        R::String => alt([r(R::Quoted), r(R::Literal)]),
        R::Quoted => cat([dquote(), many(quoted_char()), dquote()]),
        R::Literal => cat([
            byte(b'{'),
            r(R::LiteralSize),
            byte(b'}'),
            crlf(),
            r(R::LiteralData),
        ]),
        R::LiteralSize => Node::Terminal(Terminal::LiteralSize),
        R::LiteralData => Node::Terminal(Terminal::LiteralData),
        R::Atom => many1(class(C::AtomChar)),
        R::Nil => kw(b"NIL"),
        R::Number => many1(digit()),
        R::NzNumber => cat([class(C::DigitNz), many(digit())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_every_rule() {
        let grammar = Grammar::imap();
        assert_eq!(grammar.definitions.len(), Rule::COUNT);
        assert!(matches!(grammar.definition(Rule::Nil), Node::Keyword(b"NIL")));
    }

    #[test]
    fn rule_names_are_abnf() {
        assert_eq!(Rule::RespTextCode.name(), "resp-text-code");
        assert_eq!(Rule::BodyType1Part.to_string(), "body-type-1part");
    }

    #[test]
    fn atom_char_excludes_specials() {
        for c in b"(){ %*\"\\]" {
            assert!(!CharClass::AtomChar.contains(*c), "{}", *c as char);
        }
        assert!(CharClass::AtomChar.contains(b'$'));
        assert!(CharClass::AstringChar.contains(b']'));
        assert!(!CharClass::TagChar.contains(b'+'));
        assert!(!CharClass::AtomChar.contains(0xC3));
        assert!(CharClass::QuotedSafe.contains(0xC3));
    }
}
