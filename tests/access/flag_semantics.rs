use class_link::{ AccessFlags, AccessOperation, Finality, Visibility };

const PUBLIC: AccessFlags = AccessFlags::PUBLIC ;
const PRIVATE: AccessFlags = AccessFlags::PRIVATE ;
const PROTECTED: AccessFlags = AccessFlags::PROTECTED ;
const FINAL: AccessFlags = AccessFlags::FINAL ;
const STATIC: AccessFlags = AccessFlags::STATIC ;

#[test]
fn flag_semantics_visibility() {

	assert_eq!( Visibility::Public.apply( PRIVATE | STATIC ), PUBLIC | STATIC );
	assert_eq!( Visibility::Public.apply( PROTECTED ), PUBLIC );

	assert_eq!( Visibility::Protected.apply( PRIVATE | FINAL ), PROTECTED | FINAL );
	assert_eq!( Visibility::Protected.apply( AccessFlags::empty() ), PROTECTED );
	// Never narrows a public member.
	assert_eq!( Visibility::Protected.apply( PUBLIC ), PUBLIC );

	assert_eq!( Visibility::Default.apply( PUBLIC | STATIC ), STATIC );
	assert_eq!( Visibility::Default.apply( PRIVATE ), AccessFlags::empty() );

	assert_eq!( Visibility::Private.apply( PUBLIC | FINAL ), PRIVATE | FINAL );
	assert_eq!( Visibility::Private.apply( PROTECTED ), PRIVATE );

}

#[test]
fn flag_semantics_finality() {

	assert_eq!( Finality::Add.apply( PUBLIC ), PUBLIC | FINAL );
	assert_eq!( Finality::Remove.apply( PUBLIC | FINAL ), PUBLIC );
	assert_eq!( Finality::Unchanged.apply( PRIVATE | FINAL ), PRIVATE | FINAL );

}

#[test]
fn flag_semantics_operation_keeps_unrelated_bits() {

	let flags = PRIVATE | FINAL | STATIC | AccessFlags::SYNTHETIC ;
	let operation = AccessOperation::new( Visibility::Public, Finality::Remove );

	assert_eq!( operation.apply( flags ), PUBLIC | STATIC | AccessFlags::SYNTHETIC );

}

#[test]
fn flag_semantics_ranking() {

	let mut ranked = [ Visibility::Default, Visibility::Public, Visibility::Private, Visibility::Protected ];
	ranked.sort_by_key(| visibility | std::cmp::Reverse( visibility.rank() ));

	assert_eq!( ranked, [ Visibility::Public, Visibility::Protected, Visibility::Default, Visibility::Private ]);

}
