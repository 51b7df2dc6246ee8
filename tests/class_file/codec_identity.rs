use class_link::{ AccessFlags, ClassNode, Constant };
use once_cell::sync::Lazy ;

fn utf8( out: &mut Vec<u8>, text: &str ) {
	out.push( 1 );
	out.extend( u16::try_from( text.len() ).unwrap().to_be_bytes() );
	out.extend( text.as_bytes() );
}

fn u16s( out: &mut Vec<u8>, values: &[u16] ) { values.iter().for_each(| value | out.extend( value.to_be_bytes() )); }

/// `com/example/Sample` with a long constant field, a constructor with a body
/// and a source file attribute, laid out the way javac would.
static SAMPLE_CLASS: Lazy<Vec<u8>> = Lazy::new( assemble_sample );

fn assemble_sample() -> Vec<u8> {
	let mut out = vec![ 0xCA, 0xFE, 0xBA, 0xBE ];
	u16s( &mut out, &[ 0, 65, 21 ]);

	utf8( &mut out, "com/example/Sample" );		// 1
	out.push( 7 ); u16s( &mut out, &[ 1 ]);			// 2
	utf8( &mut out, "java/lang/Object" );			// 3
	out.push( 7 ); u16s( &mut out, &[ 3 ]);			// 4
	utf8( &mut out, "value" );						// 5
	utf8( &mut out, "J" );							// 6
	out.push( 5 ); out.extend( 0x0000_0001_0000_0002u64.to_be_bytes() ); // 7, 8
	utf8( &mut out, "ConstantValue" );				// 9
	utf8( &mut out, "<init>" );						// 10
	utf8( &mut out, "()V" );						// 11
	out.push( 12 ); u16s( &mut out, &[ 10, 11 ]);	// 12
	out.push( 10 ); u16s( &mut out, &[ 4, 12 ]);	// 13
	utf8( &mut out, "Code" );						// 14
	out.push( 8 ); u16s( &mut out, &[ 5 ]);			// 15
	out.push( 3 ); out.extend( 42u32.to_be_bytes() ); // 16
	out.push( 6 ); out.extend( 2.5f64.to_bits().to_be_bytes() ); // 17, 18
	utf8( &mut out, "SourceFile" );					// 19
	utf8( &mut out, "Sample.java" );				// 20

	u16s( &mut out, &[ 0x0021, 2, 4, 0 ]);

	// private static final long value = ...
	u16s( &mut out, &[ 1, 0x001A, 5, 6, 1, 9 ]);
	out.extend( 2u32.to_be_bytes() );
	u16s( &mut out, &[ 7 ]);

	// public <init>()V { aload_0; invokespecial Object.<init>; return }
	u16s( &mut out, &[ 1, 0x0001, 10, 11, 1, 14 ]);
	out.extend( 17u32.to_be_bytes() );
	u16s( &mut out, &[ 1, 1 ]);
	out.extend( 5u32.to_be_bytes() );
	out.extend([ 0x2A, 0xB7, 0x00, 0x0D, 0xB1 ]);
	u16s( &mut out, &[ 0, 0 ]);

	u16s( &mut out, &[ 1, 19 ]);
	out.extend( 2u32.to_be_bytes() );
	u16s( &mut out, &[ 20 ]);

	out
}

#[test]
fn codec_identity_unmodified_node_writes_identical_bytes() {

	let bytes = SAMPLE_CLASS.as_slice();
	let node = ClassNode::parse( bytes ).expect( "Failed to parse sample class" );

	match node.to_bytes() {
		Ok( written ) if written.as_slice() == bytes => {}
		other => panic!( "Expected the parsed bytes back, found: {:?}", other ),
	}

}

#[test]
fn codec_identity_reads_the_class_layout() {

	let node = ClassNode::parse( &SAMPLE_CLASS ).expect( "Failed to parse sample class" );

	assert_eq!( node.name().unwrap(), "com/example/Sample" );
	assert_eq!( node.super_name().unwrap(), Some( "java/lang/Object" ));
	assert_eq!( node.access, AccessFlags::PUBLIC | AccessFlags::SUPER );
	assert_eq!( node.constant_pool.count(), 21 );
	assert_eq!( node.fields().len(), 1 );
	assert_eq!( node.methods().len(), 1 );
	assert_eq!( node.methods()[0].attributes[0].info.len(), 17 );

	match ( node.constant_pool.get( 7 ), node.constant_pool.get( 8 ), node.constant_pool.get( 16 )) {
		( Some( Constant::Long( 0x0000_0001_0000_0002 )), None, Some( Constant::Integer( 42 ))) => {}
		other => panic!( "Expected Long( 4294967298 ), phantom slot, Integer( 42 ), found: {:?}", other ),
	}

}

#[test]
fn codec_identity_flag_change_touches_only_the_flags() {

	let bytes = SAMPLE_CLASS.as_slice();
	let mut node = ClassNode::parse( bytes ).expect( "Failed to parse sample class" );
	node.field_mut( "value" ).expect( "Missing field" ).access = AccessFlags::PUBLIC | AccessFlags::STATIC ;
	let written = node.to_bytes().expect( "Failed to write class" );

	assert_eq!( written.len(), bytes.len() );
	let differing = bytes.iter().zip( &written ).filter(|( left, right )| left != right ).count();
	assert_eq!( differing, 1 );

	let reparsed = ClassNode::parse( &written ).expect( "Failed to reparse class" );
	assert_eq!( reparsed, node );

}
